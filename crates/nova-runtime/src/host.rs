use std::{
    ffi::CString,
    fs,
    panic::{AssertUnwindSafe, catch_unwind},
    path::{Path, PathBuf},
    sync::{Arc, atomic::Ordering},
    thread::{self, JoinHandle},
};

use libretro_bridge::{Core, CoreSymbols, GameInfo, SerializeError, SystemInfo};
use parking_lot::Mutex;

use crate::{
    audio::{AudioSink, AudioStage},
    callbacks,
    directories::Directories,
    runner::{self, Runner},
    state::HostState,
    types::{HostConfig, HostError, PixelFormat},
    video::Surface,
};

/// Everything the core callbacks can reach.
pub(crate) struct HostShared {
    pub(crate) config: HostConfig,
    pub(crate) state: HostState,
    pub(crate) stage: Mutex<AudioStage>,
    pub(crate) surface: Mutex<Option<Box<dyn Surface>>>,
    pub(crate) sink: Mutex<Option<Arc<dyn AudioSink>>>,
    pub(crate) directories: Mutex<Directories>,
}

impl HostShared {
    pub(crate) fn new(config: HostConfig) -> Self {
        Self {
            config,
            state: HostState::new(),
            stage: Mutex::new(AudioStage::new(config.flush_threshold())),
            surface: Mutex::new(None),
            sink: Mutex::new(None),
            directories: Mutex::new(Directories::default()),
        }
    }

    /// Hands samples to the bound sink. The binding is cloned out of its lock
    /// first; without a binding the samples are dropped.
    pub(crate) fn flush_audio(&self, samples: &[i16]) {
        let sink = self.sink.lock().clone();
        if let Some(sink) = sink {
            sink.write(samples);
        }
    }

    pub(crate) fn flush_residual_audio(&self) {
        let residual = self.stage.lock().drain_residual();
        if let Some(samples) = residual {
            self.flush_audio(&samples);
        }
    }
}

/// A libretro host instance.
///
/// Owns at most one resident core and the emulation thread driving it. All
/// methods take `&self` and may be called from any thread; lifecycle calls
/// (`load_core`, `load_game`, `quit`, `unload_core`) serialize on an internal
/// lock, and everything that enters the core (`retro_run`, save states, reset,
/// cheats) serializes on the core-entry lock.
///
/// The core's callbacks are bound to the host that most recently installed a
/// core; only one host should hold a core at a time.
pub struct Host {
    shared: Arc<HostShared>,
    core: Arc<Mutex<Option<Core>>>,
    info: Mutex<Option<SystemInfo>>,
    runner: Mutex<Option<JoinHandle<()>>>,
}

impl Default for Host {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

impl Host {
    pub fn new(config: HostConfig) -> Self {
        callbacks::install_log_sink();
        Self {
            shared: Arc::new(HostShared::new(config)),
            core: Arc::new(Mutex::new(None)),
            info: Mutex::new(None),
            runner: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.shared.config
    }

    /// Binds (or clears) the audio destination. Takes effect on the next flush.
    pub fn set_audio_sink(&self, sink: Option<Arc<dyn AudioSink>>) {
        *self.shared.sink.lock() = sink;
    }

    pub fn set_directories(&self, system: &str, save: &str) -> Result<(), HostError> {
        self.shared.directories.lock().set(system, save)?;
        tracing::info!("system dir: {system}, save dir: {save}");
        Ok(())
    }

    /// Loads a core shared object, replacing any resident core.
    ///
    /// On failure no core is resident.
    pub fn load_core(&self, path: impl AsRef<Path>) -> Result<(), HostError> {
        let path = path.as_ref();
        let mut lifecycle = self.runner.lock();
        self.teardown_core(&mut lifecycle);

        let core = unsafe { Core::open(path) }.inspect_err(|e| {
            tracing::error!("failed to load core {}: {e}", path.display());
        })?;
        self.install_core(core);
        Ok(())
    }

    /// Installs an in-process core, replacing any resident core.
    ///
    /// # Safety
    /// See [`Core::from_symbols`]: every entry point must honour the libretro
    /// contract while the core stays resident.
    pub unsafe fn load_core_from_symbols(&self, symbols: CoreSymbols) -> Result<(), HostError> {
        let mut lifecycle = self.runner.lock();
        self.teardown_core(&mut lifecycle);

        let core = unsafe { Core::from_symbols(symbols) }?;
        self.install_core(core);
        Ok(())
    }

    /// Stops any game, deinitialises and closes the resident core.
    pub fn unload_core(&self) {
        let mut lifecycle = self.runner.lock();
        self.teardown_core(&mut lifecycle);
    }

    fn install_core(&self, mut core: Core) {
        self.shared.state.set_pixel_format(PixelFormat::Rgb565);
        callbacks::activate(&self.shared);
        core.install_callbacks(&callbacks::callback_set());
        core.init();

        let info = core.system_info();
        match &info {
            Some(info) => tracing::info!(
                "core initialised: {} {} (extensions: {})",
                info.library_name,
                info.library_version,
                info.valid_extensions.as_deref().unwrap_or("-"),
            ),
            None => tracing::info!("core initialised"),
        }

        self.shared.directories.lock().core_loaded();
        *self.info.lock() = info;
        *self.core.lock() = Some(core);
    }

    fn teardown_core(&self, lifecycle: &mut Option<JoinHandle<()>>) {
        self.stop_locked(lifecycle);

        let core = self.core.lock().take();
        if core.is_none() {
            return;
        }
        // Dropping the core runs retro_deinit and closes the library.
        drop(core);
        *self.info.lock() = None;
        self.shared.directories.lock().core_unloaded();
        callbacks::deactivate(&self.shared);
        tracing::info!("core unloaded");
    }

    /// Loads content and starts the emulation thread, stopping any running
    /// game first.
    pub fn load_game(&self, path: impl AsRef<Path>) -> Result<(), HostError> {
        let path = path.as_ref();
        let mut lifecycle = self.runner.lock();
        self.stop_locked(&mut lifecycle);

        let c_path = path
            .to_str()
            .and_then(|p| CString::new(p).ok())
            .ok_or_else(|| HostError::InvalidPath(path.to_path_buf()))?;

        {
            let core = self.core.lock();
            let core = core.as_ref().ok_or(HostError::NoCore)?;

            self.shared.stage.lock().clear();
            self.shared.state.paused.store(false, Ordering::Relaxed);

            let data = self.content_for(path);
            let mut game = GameInfo::from_path(&c_path);
            if let Some(data) = data.as_deref() {
                game = game.with_data(data);
            }
            if !core.load_game(&game) {
                tracing::error!("core rejected {}", path.display());
                return Err(HostError::ContentRejected(path.to_path_buf()));
            }
        }

        self.shared.state.running.store(true, Ordering::Relaxed);
        let mut pacer = Runner::new(Arc::clone(&self.shared), Arc::clone(&self.core));
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(runner::THREAD_NAME.into())
            .spawn(move || {
                if catch_unwind(AssertUnwindSafe(|| pacer.run())).is_err() {
                    tracing::error!("emulation thread panicked");
                }
                shared.state.running.store(false, Ordering::Relaxed);
            });

        match spawned {
            Ok(handle) => {
                *lifecycle = Some(handle);
                tracing::info!(
                    "game loaded: {} (pacing at {:.2} Hz)",
                    path.display(),
                    runner::period_hz(self.shared.config.frame_period)
                );
                Ok(())
            }
            Err(e) => {
                self.shared.state.running.store(false, Ordering::Relaxed);
                if let Some(core) = self.core.lock().as_ref() {
                    core.unload_game();
                }
                tracing::error!("failed to spawn emulation thread: {e}");
                Err(HostError::ThreadSpawn(e))
            }
        }
    }

    /// Content bytes for cores that do not want a full path.
    fn content_for(&self, path: &Path) -> Option<Vec<u8>> {
        let need_fullpath = self
            .info
            .lock()
            .as_ref()
            .is_none_or(|info| info.need_fullpath);
        if need_fullpath {
            return None;
        }
        match fs::read(path) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!("failed to read {}, passing path only: {e}", path.display());
                None
            }
        }
    }

    /// Stops the emulation thread and unloads the game. Idempotent.
    pub fn quit(&self) {
        let mut lifecycle = self.runner.lock();
        self.stop_locked(&mut lifecycle);
    }

    fn stop_locked(&self, lifecycle: &mut Option<JoinHandle<()>>) {
        self.shared.state.running.store(false, Ordering::Relaxed);
        if let Some(handle) = lifecycle.take() {
            if handle.join().is_err() {
                tracing::error!("emulation thread terminated abnormally");
            }
            if let Some(core) = self.core.lock().as_ref() {
                core.unload_game();
            }
            tracing::info!("game stopped");
        }
        self.shared.stage.lock().clear();
    }

    pub fn pause(&self) {
        self.shared.state.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.shared.state.paused.store(false, Ordering::Relaxed);
    }

    pub fn set_fast_forward(&self, enabled: bool) {
        self.shared.state.fast_forward.store(enabled, Ordering::Relaxed);
    }

    /// Forwards to `retro_reset`; `false` without a core or reset entry point.
    pub fn reset(&self) -> bool {
        self.core.lock().as_ref().is_some_and(Core::reset)
    }

    /// Binds a new surface (or clears it). The previous surface is released
    /// after any frame being blitted into it has been posted.
    pub fn set_surface(&self, surface: Option<Box<dyn Surface>>) {
        let previous = std::mem::replace(&mut *self.shared.surface.lock(), surface);
        drop(previous);
    }

    /// Presses or releases joypad button `id` on port 0.
    pub fn send_input(&self, id: u32, pressed: bool) {
        self.shared.state.set_button(id, pressed);
    }

    /// Serializes the core into `path`. Runs between frames.
    pub fn save_state(&self, path: impl AsRef<Path>) -> Result<(), HostError> {
        let path = path.as_ref();
        let state = {
            let core = self.core.lock();
            let core = core.as_ref().ok_or(HostError::NoCore)?;
            let size = core
                .serialize_size()
                .filter(|&size| size > 0)
                .ok_or(HostError::SaveStateUnsupported)?;
            let mut state = vec![0u8; size];
            core.serialize(&mut state)
                .map_err(|e| serialize_error(e, "serialize"))?;
            state
        };

        fs::write(path, &state).map_err(|source| state_io(path, source))?;
        tracing::info!("saved {} byte state to {}", state.len(), path.display());
        Ok(())
    }

    /// Restores the core from `path`. On failure the core keeps running
    /// untouched.
    pub fn load_state(&self, path: impl AsRef<Path>) -> Result<(), HostError> {
        let path = path.as_ref();
        let state = fs::read(path).map_err(|source| state_io(path, source))?;

        let core = self.core.lock();
        let core = core.as_ref().ok_or(HostError::NoCore)?;
        core.unserialize(&state)
            .map_err(|e| serialize_error(e, "unserialize"))?;
        tracing::info!("loaded {} byte state from {}", state.len(), path.display());
        Ok(())
    }

    pub fn set_cheat(&self, index: u32, enabled: bool, code: &str) -> Result<(), HostError> {
        let code = CString::new(code).map_err(|_| HostError::InvalidCheat)?;
        let core = self.core.lock();
        let core = core.as_ref().ok_or(HostError::NoCore)?;
        if !core.cheat_set(index, enabled, &code) {
            tracing::debug!("core has no cheat support, ignoring cheat {index}");
        }
        Ok(())
    }

    pub fn cheat_reset(&self) {
        if let Some(core) = self.core.lock().as_ref() {
            core.cheat_reset();
        }
    }

    /// Metadata of the resident core, if it exports `retro_get_system_info`.
    pub fn core_info(&self) -> Option<SystemInfo> {
        self.info.lock().clone()
    }

    pub fn has_core(&self) -> bool {
        self.core.lock().is_some()
    }

    pub fn native_fps(&self) -> u32 {
        self.shared.config.native_fps
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.shared.state.is_paused()
    }

    pub fn is_fast_forward(&self) -> bool {
        self.shared.state.is_fast_forward()
    }

    pub fn input_bits(&self) -> u16 {
        self.shared.state.input_bits()
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.shared.state.pixel_format()
    }

    /// Number of `retro_run` calls made since the host was created.
    pub fn frames_run(&self) -> u64 {
        self.shared.state.frame_seq.load(Ordering::Relaxed)
    }

    /// Samples currently staged and not yet flushed.
    pub fn staged_samples(&self) -> usize {
        self.shared.stage.lock().cursor()
    }

    pub fn is_emulation_thread_alive(&self) -> bool {
        self.runner
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.unload_core();
    }
}

fn serialize_error(error: SerializeError, op: &'static str) -> HostError {
    match error {
        SerializeError::Unsupported => HostError::SaveStateUnsupported,
        SerializeError::Rejected => HostError::SaveStateRejected { op },
    }
}

fn state_io(path: &Path, source: std::io::Error) -> HostError {
    HostError::StateIo {
        path: PathBuf::from(path),
        source,
    }
}
