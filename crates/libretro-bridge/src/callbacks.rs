use crate::raw;

/// The six callbacks a frontend installs into a core.
///
/// Every field is optional; [`Core::install_callbacks`](crate::Core::install_callbacks)
/// only forwards the ones that are set, and only to cores that export the
/// matching `retro_set_*` installer.
#[derive(Clone, Copy, Default)]
pub struct CallbackSet {
    pub environment: raw::retro_environment_t,
    pub video: raw::retro_video_refresh_t,
    pub audio_sample: raw::retro_audio_sample_t,
    pub audio_batch: raw::retro_audio_sample_batch_t,
    pub input_poll: raw::retro_input_poll_t,
    pub input_state: raw::retro_input_state_t,
}

impl CallbackSet {
    pub fn with_environment(mut self, cb: raw::retro_environment_t) -> Self {
        self.environment = cb;
        self
    }

    pub fn with_video(mut self, cb: raw::retro_video_refresh_t) -> Self {
        self.video = cb;
        self
    }

    pub fn with_audio_sample(mut self, cb: raw::retro_audio_sample_t) -> Self {
        self.audio_sample = cb;
        self
    }

    pub fn with_audio_batch(mut self, cb: raw::retro_audio_sample_batch_t) -> Self {
        self.audio_batch = cb;
        self
    }

    pub fn with_input_poll(mut self, cb: raw::retro_input_poll_t) -> Self {
        self.input_poll = cb;
        self
    }

    pub fn with_input_state(mut self, cb: raw::retro_input_state_t) -> Self {
        self.input_state = cb;
        self
    }
}
