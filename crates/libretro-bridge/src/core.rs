use std::{
    ffi::{CStr, c_char, c_void},
    path::{Path, PathBuf},
    ptr,
};

#[cfg(unix)]
use libloading::os::unix::{Library, RTLD_LOCAL, RTLD_NOW};
#[cfg(not(unix))]
use libloading::Library;

use crate::{callbacks::CallbackSet, raw, symbols::CoreSymbols};

/// Error returned while bringing a core into memory.
#[derive(Debug, thiserror::Error)]
pub enum CoreLoadError {
    #[error("failed to open core {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("core is missing required function {symbol}: {source}")]
    MissingSymbol {
        symbol: &'static str,
        #[source]
        source: libloading::Error,
    },
    #[error("core table is missing required function {symbol}")]
    IncompleteTable { symbol: &'static str },
}

/// Error returned by the save-state entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SerializeError {
    #[error("core does not support save states")]
    Unsupported,
    #[error("core rejected the save state")]
    Rejected,
}

/// Metadata read from `retro_get_system_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub library_name: String,
    pub library_version: String,
    /// Pipe-delimited list of file extensions the core can load.
    pub valid_extensions: Option<String>,
    /// The core wants a path on disk rather than a memory buffer.
    pub need_fullpath: bool,
    pub block_extract: bool,
}

impl SystemInfo {
    /// # Safety
    /// String pointers in `info` must be null or point at NUL-terminated strings.
    unsafe fn from_raw(info: &raw::retro_system_info) -> Self {
        unsafe {
            Self {
                library_name: c_str_to_string(info.library_name).unwrap_or_default(),
                library_version: c_str_to_string(info.library_version).unwrap_or_default(),
                valid_extensions: c_str_to_string(info.valid_extensions),
                need_fullpath: info.need_fullpath,
                block_extract: info.block_extract,
            }
        }
    }
}

/// Content handed to `retro_load_game`.
#[derive(Debug, Clone, Copy)]
pub struct GameInfo<'a> {
    pub path: &'a CStr,
    /// File contents, for cores that do not ask for a full path.
    pub data: Option<&'a [u8]>,
}

impl<'a> GameInfo<'a> {
    pub fn from_path(path: &'a CStr) -> Self {
        Self { path, data: None }
    }

    pub fn with_data(mut self, data: &'a [u8]) -> Self {
        self.data = Some(data);
        self
    }

    fn to_raw(self) -> raw::retro_game_info {
        let (data, size) = match self.data {
            Some(bytes) => (bytes.as_ptr() as *const c_void, bytes.len()),
            None => (ptr::null(), 0),
        };
        raw::retro_game_info {
            path: self.path.as_ptr(),
            data,
            size,
            meta: ptr::null(),
        }
    }
}

/// A resident libretro core.
///
/// Owns the dynamic library (when loaded from disk) together with its resolved
/// entry points. Dropping a `Core` calls `retro_deinit` if `retro_init` ran and
/// then closes the library, so no function pointer outlives its code.
pub struct Core {
    symbols: CoreSymbols,
    initialized: bool,
    _library: Option<Library>,
}

impl Core {
    /// Opens a core shared object with immediate binding and local scope.
    ///
    /// # Safety
    /// Loading runs the library's initialisers, and every exported `retro_*`
    /// symbol is trusted to match its `libretro.h` signature.
    pub unsafe fn open(path: impl AsRef<Path>) -> Result<Self, CoreLoadError> {
        let path = path.as_ref();
        let library = unsafe { open_library(path) }.map_err(|source| CoreLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let symbols = unsafe { CoreSymbols::resolve(&library)? };
        tracing::info!("opened core {}", path.display());

        Ok(Self {
            symbols,
            initialized: false,
            _library: Some(library),
        })
    }

    /// Wraps an in-process entry point table, e.g. a statically linked core.
    ///
    /// # Safety
    /// Every function pointer in `symbols` must honour the libretro contract
    /// for as long as the returned `Core` lives.
    pub unsafe fn from_symbols(symbols: CoreSymbols) -> Result<Self, CoreLoadError> {
        if let Some(symbol) = symbols.missing_required() {
            return Err(CoreLoadError::IncompleteTable { symbol });
        }

        Ok(Self {
            symbols,
            initialized: false,
            _library: None,
        })
    }

    /// Hands the callbacks to every `retro_set_*` installer the core exports.
    pub fn install_callbacks(&self, callbacks: &CallbackSet) {
        let s = &self.symbols;
        unsafe {
            if let Some(set) = s.set_environment {
                set(callbacks.environment);
            }
            if let Some(set) = s.set_video_refresh {
                set(callbacks.video);
            }
            if let Some(set) = s.set_audio_sample {
                set(callbacks.audio_sample);
            }
            if let Some(set) = s.set_audio_sample_batch {
                set(callbacks.audio_batch);
            }
            if let Some(set) = s.set_input_poll {
                set(callbacks.input_poll);
            }
            if let Some(set) = s.set_input_state {
                set(callbacks.input_state);
            }
        }
    }

    pub fn init(&mut self) {
        if self.initialized {
            return;
        }
        if let Some(init) = self.symbols.init {
            unsafe { init() };
        }
        self.initialized = true;
    }

    pub fn system_info(&self) -> Option<SystemInfo> {
        let get = self.symbols.get_system_info?;
        let mut info = raw::retro_system_info::default();
        unsafe {
            get(&mut info);
            Some(SystemInfo::from_raw(&info))
        }
    }

    /// Calls `retro_load_game`; returns the core's verdict.
    pub fn load_game(&self, game: &GameInfo<'_>) -> bool {
        let Some(load_game) = self.symbols.load_game else {
            return false;
        };
        let info = game.to_raw();
        unsafe { load_game(&info) }
    }

    pub fn run(&self) {
        if let Some(run) = self.symbols.run {
            unsafe { run() };
        }
    }

    pub fn unload_game(&self) {
        if let Some(unload_game) = self.symbols.unload_game {
            unsafe { unload_game() };
        }
    }

    /// Returns `false` when the core has no `retro_reset`.
    pub fn reset(&self) -> bool {
        match self.symbols.reset {
            Some(reset) => {
                unsafe { reset() };
                true
            }
            None => false,
        }
    }

    /// Size of a save state; `None` when unsupported.
    pub fn serialize_size(&self) -> Option<usize> {
        self.symbols.serialize_size.map(|size| unsafe { size() })
    }

    pub fn serialize(&self, dst: &mut [u8]) -> Result<(), SerializeError> {
        let serialize = self.symbols.serialize.ok_or(SerializeError::Unsupported)?;
        if unsafe { serialize(dst.as_mut_ptr() as *mut c_void, dst.len()) } {
            Ok(())
        } else {
            Err(SerializeError::Rejected)
        }
    }

    pub fn unserialize(&self, src: &[u8]) -> Result<(), SerializeError> {
        let unserialize = self
            .symbols
            .unserialize
            .ok_or(SerializeError::Unsupported)?;
        if unsafe { unserialize(src.as_ptr() as *const c_void, src.len()) } {
            Ok(())
        } else {
            Err(SerializeError::Rejected)
        }
    }

    pub fn cheat_reset(&self) {
        if let Some(cheat_reset) = self.symbols.cheat_reset {
            unsafe { cheat_reset() };
        }
    }

    /// Returns `false` when the core has no `retro_cheat_set`.
    pub fn cheat_set(&self, index: u32, enabled: bool, code: &CStr) -> bool {
        match self.symbols.cheat_set {
            Some(cheat_set) => {
                unsafe { cheat_set(index, enabled, code.as_ptr()) };
                true
            }
            None => false,
        }
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        if !self.initialized {
            return;
        }
        if let Some(deinit) = self.symbols.deinit {
            unsafe { deinit() };
        }
    }
}

#[cfg(unix)]
unsafe fn open_library(path: &Path) -> Result<Library, libloading::Error> {
    unsafe { Library::open(Some(path), RTLD_NOW | RTLD_LOCAL) }
}

#[cfg(not(unix))]
unsafe fn open_library(path: &Path) -> Result<Library, libloading::Error> {
    unsafe { Library::new(path) }
}

unsafe fn c_str_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }

    Some(
        unsafe { CStr::from_ptr(ptr) }
            .to_string_lossy()
            .into_owned(),
    )
}
