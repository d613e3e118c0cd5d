use anyhow::Context;
use jni::{
    JNIEnv, JavaVM,
    objects::{GlobalRef, JMethodID, JObject, JValue},
    signature::{Primitive, ReturnType},
    sys::jsize,
};
use nova_runtime::AudioSink;

use crate::Latch;

const WRITE_AUDIO: &str = "writeAudio";
const WRITE_AUDIO_SIG: &str = "([SI)V";

/// Delivers audio to `MainActivity.writeAudio(short[], int)`.
pub(crate) struct JniAudioSink {
    vm: JavaVM,
    activity: GlobalRef,
    write_audio: JMethodID,
    attach_failed: Latch,
}

impl JniAudioSink {
    pub(crate) fn new(env: &mut JNIEnv, activity: &JObject) -> jni::errors::Result<Self> {
        let vm = env.get_java_vm()?;
        let activity = env.new_global_ref(activity)?;
        let class = env.get_object_class(&activity)?;
        let write_audio = env.get_method_id(&class, WRITE_AUDIO, WRITE_AUDIO_SIG)?;
        Ok(Self {
            vm,
            activity,
            write_audio,
            attach_failed: Latch::default(),
        })
    }

    fn deliver(&self, env: &mut JNIEnv, samples: &[i16]) -> anyhow::Result<()> {
        let len = jsize::try_from(samples.len()).context("audio chunk too large")?;
        // Permanently attached threads never pop a frame, so scope the array.
        env.with_local_frame(2, |env| -> anyhow::Result<()> {
            let array = env.new_short_array(len)?;
            env.set_short_array_region(&array, 0, samples)?;
            let args = [JValue::Object(&array).as_jni(), JValue::Int(len).as_jni()];
            unsafe {
                env.call_method_unchecked(
                    &self.activity,
                    self.write_audio,
                    ReturnType::Primitive(Primitive::Void),
                    &args,
                )
            }?;
            Ok(())
        })
    }
}

impl AudioSink for JniAudioSink {
    fn attach_current_thread(&self) -> anyhow::Result<()> {
        if let Err(e) = self.vm.attach_current_thread_permanently() {
            self.attach_failed.trip();
            return Err(e).context("AttachCurrentThread failed");
        }
        Ok(())
    }

    fn write(&self, samples: &[i16]) {
        // Output stays off once attaching has failed.
        if self.attach_failed.is_tripped() {
            return;
        }
        let mut env = match self.vm.attach_current_thread_permanently() {
            Ok(env) => env,
            Err(e) => {
                if self.attach_failed.trip() {
                    tracing::error!("cannot attach thread for audio, output disabled: {e}");
                }
                return;
            }
        };

        if let Err(e) = self.deliver(&mut env, samples) {
            tracing::debug!("writeAudio failed: {e:#}");
        }
        if env.exception_check().unwrap_or(false) {
            let _ = env.exception_describe();
            let _ = env.exception_clear();
        }
    }
}
