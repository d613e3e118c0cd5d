use crate::{core::CoreLoadError, raw};

#[cfg(unix)]
use libloading::os::unix::Library;
#[cfg(not(unix))]
use libloading::Library;

/// Entry point table of a libretro core.
///
/// `init`, `load_game` and `run` are mandatory; every other entry point may be
/// absent and the corresponding host feature degrades to a no-op.
#[derive(Clone, Copy, Default)]
pub struct CoreSymbols {
    pub init: Option<raw::retro_init_t>,
    pub load_game: Option<raw::retro_load_game_t>,
    pub run: Option<raw::retro_run_t>,
    pub deinit: Option<raw::retro_deinit_t>,
    pub unload_game: Option<raw::retro_unload_game_t>,
    pub reset: Option<raw::retro_reset_t>,
    pub get_system_info: Option<raw::retro_get_system_info_t>,
    pub serialize_size: Option<raw::retro_serialize_size_t>,
    pub serialize: Option<raw::retro_serialize_t>,
    pub unserialize: Option<raw::retro_unserialize_t>,
    pub cheat_reset: Option<raw::retro_cheat_reset_t>,
    pub cheat_set: Option<raw::retro_cheat_set_t>,
    pub set_environment: Option<raw::retro_set_environment_t>,
    pub set_video_refresh: Option<raw::retro_set_video_refresh_t>,
    pub set_audio_sample: Option<raw::retro_set_audio_sample_t>,
    pub set_audio_sample_batch: Option<raw::retro_set_audio_sample_batch_t>,
    pub set_input_poll: Option<raw::retro_set_input_poll_t>,
    pub set_input_state: Option<raw::retro_set_input_state_t>,
}

pub(crate) const REQUIRED_SYMBOLS: [&str; 3] = ["retro_init", "retro_load_game", "retro_run"];

impl CoreSymbols {
    /// Resolves the table from an opened library.
    ///
    /// Missing optional symbols resolve to `None`. A missing required symbol
    /// fails with the dynamic linker's diagnostic.
    ///
    /// # Safety
    /// The library must be a libretro core: every resolved symbol is trusted to
    /// have the signature `libretro.h` declares for it.
    pub(crate) unsafe fn resolve(library: &Library) -> Result<Self, CoreLoadError> {
        unsafe {
            Ok(Self {
                init: Some(required(library, "retro_init")?),
                load_game: Some(required(library, "retro_load_game")?),
                run: Some(required(library, "retro_run")?),
                deinit: optional(library, "retro_deinit"),
                unload_game: optional(library, "retro_unload_game"),
                reset: optional(library, "retro_reset"),
                get_system_info: optional(library, "retro_get_system_info"),
                serialize_size: optional(library, "retro_serialize_size"),
                serialize: optional(library, "retro_serialize"),
                unserialize: optional(library, "retro_unserialize"),
                cheat_reset: optional(library, "retro_cheat_reset"),
                cheat_set: optional(library, "retro_cheat_set"),
                set_environment: optional(library, "retro_set_environment"),
                set_video_refresh: optional(library, "retro_set_video_refresh"),
                set_audio_sample: optional(library, "retro_set_audio_sample"),
                set_audio_sample_batch: optional(library, "retro_set_audio_sample_batch"),
                set_input_poll: optional(library, "retro_set_input_poll"),
                set_input_state: optional(library, "retro_set_input_state"),
            })
        }
    }

    /// Returns the first mandatory entry point the table lacks, if any.
    pub fn missing_required(&self) -> Option<&'static str> {
        let present = [
            self.init.is_some(),
            self.load_game.is_some(),
            self.run.is_some(),
        ];
        REQUIRED_SYMBOLS
            .iter()
            .zip(present)
            .find(|(_, present)| !present)
            .map(|(name, _)| *name)
    }
}

unsafe fn lookup<T: Copy>(library: &Library, name: &str) -> Result<T, libloading::Error> {
    let symbol = unsafe { library.get::<T>(name.as_bytes())? };
    Ok(*symbol)
}

unsafe fn required<T: Copy>(library: &Library, name: &'static str) -> Result<T, CoreLoadError> {
    unsafe { lookup(library, name) }.map_err(|source| CoreLoadError::MissingSymbol {
        symbol: name,
        source,
    })
}

unsafe fn optional<T: Copy>(library: &Library, name: &'static str) -> Option<T> {
    match unsafe { lookup(library, name) } {
        Ok(symbol) => Some(symbol),
        Err(_) => {
            tracing::debug!("core does not export {name}");
            None
        }
    }
}
