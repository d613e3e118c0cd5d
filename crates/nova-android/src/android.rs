use std::{ffi::c_void, sync::Arc};

use jni::{
    JNIEnv,
    objects::{JObject, JString},
    sys::{JNI_FALSE, JNI_TRUE, JNI_VERSION_1_6, jboolean, jint, jstring},
};
use nova_runtime::AudioSink;

use crate::{host, load_core_outcome, succeeded};

mod audio;
mod window;

use audio::JniAudioSink;
use window::NativeWindowSurface;

const LOG_TAG: &str = "NovaNative";

#[unsafe(no_mangle)]
pub extern "system" fn JNI_OnLoad(_vm: *mut jni::sys::JavaVM, _reserved: *mut c_void) -> jint {
    android_logger::init_once(
        android_logger::Config::default()
            .with_max_level(log::LevelFilter::Debug)
            .with_tag(LOG_TAG),
    );
    tracing::info!("nova_native loaded");
    JNI_VERSION_1_6
}

fn java_string(env: &mut JNIEnv, value: &JString) -> Option<String> {
    if value.is_null() {
        return None;
    }
    match env.get_string(value) {
        Ok(s) => Some(s.into()),
        Err(e) => {
            tracing::error!("failed to read Java string: {e}");
            None
        }
    }
}

fn to_jboolean(value: bool) -> jboolean {
    if value { JNI_TRUE } else { JNI_FALSE }
}

/// Rebinds the activity that receives audio through `writeAudio(short[], int)`.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_updateNativeActivity(
    mut env: JNIEnv,
    thiz: JObject,
) {
    match JniAudioSink::new(&mut env, &thiz) {
        Ok(sink) => {
            host().set_audio_sink(Some(Arc::new(sink) as Arc<dyn AudioSink>));
            tracing::info!("activity bound for audio output");
        }
        Err(e) => {
            host().set_audio_sink(None);
            tracing::error!("failed to bind activity, audio disabled: {e}");
            let _ = env.exception_clear();
        }
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_setSystemDirectories(
    mut env: JNIEnv,
    _thiz: JObject,
    system_dir: JString,
    save_dir: JString,
) {
    let (Some(system), Some(save)) = (
        java_string(&mut env, &system_dir),
        java_string(&mut env, &save_dir),
    ) else {
        tracing::error!("setSystemDirectories: missing directory");
        return;
    };
    if let Err(e) = host().set_directories(&system, &save) {
        tracing::error!("setSystemDirectories failed: {e}");
    }
}

/// Returns null on success, otherwise the loader's diagnostic.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_loadCore(
    mut env: JNIEnv,
    _thiz: JObject,
    core_path: JString,
) -> jstring {
    let Some(path) = java_string(&mut env, &core_path) else {
        return new_java_string(&mut env, "core path is null");
    };
    tracing::info!("loading core: {path}");

    match load_core_outcome(host().load_core(&path)) {
        None => std::ptr::null_mut(),
        Some(message) => new_java_string(&mut env, &message),
    }
}

fn new_java_string(env: &mut JNIEnv, message: &str) -> jstring {
    match env.new_string(message) {
        Ok(s) => s.into_raw(),
        Err(e) => {
            tracing::error!("failed to allocate error string: {e}");
            std::ptr::null_mut()
        }
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_nativeLoadGame(
    mut env: JNIEnv,
    _thiz: JObject,
    rom_path: JString,
) -> jboolean {
    let Some(path) = java_string(&mut env, &rom_path) else {
        return JNI_FALSE;
    };
    to_jboolean(succeeded("nativeLoadGame", host().load_game(&path)))
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_nativePauseGame(
    _env: JNIEnv,
    _thiz: JObject,
) {
    host().pause();
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_nativeResumeGame(
    _env: JNIEnv,
    _thiz: JObject,
) {
    host().resume();
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_resetGame(_env: JNIEnv, _thiz: JObject) {
    if !host().reset() {
        tracing::debug!("resetGame: core has no reset");
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_nativeQuitGame(
    _env: JNIEnv,
    _thiz: JObject,
) {
    host().quit();
}

/// Binds the `Surface` frames are presented into; `null` unbinds.
#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_setSurface(
    env: JNIEnv,
    _thiz: JObject,
    surface: JObject,
) {
    if surface.is_null() {
        host().set_surface(None);
        return;
    }
    match NativeWindowSurface::from_surface(&env, &surface) {
        Some(window) => host().set_surface(Some(Box::new(window))),
        None => {
            tracing::error!("ANativeWindow_fromSurface failed");
            host().set_surface(None);
        }
    }
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_sendInput(
    _env: JNIEnv,
    _thiz: JObject,
    button_id: jint,
    value: jint,
) {
    let Ok(id) = u32::try_from(button_id) else {
        return;
    };
    host().send_input(id, value != 0);
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_setFastForward(
    _env: JNIEnv,
    _thiz: JObject,
    enabled: jboolean,
) {
    host().set_fast_forward(enabled != JNI_FALSE);
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_saveState(
    mut env: JNIEnv,
    _thiz: JObject,
    file_path: JString,
) -> jboolean {
    let Some(path) = java_string(&mut env, &file_path) else {
        return JNI_FALSE;
    };
    to_jboolean(succeeded("saveState", host().save_state(&path)))
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_loadState(
    mut env: JNIEnv,
    _thiz: JObject,
    file_path: JString,
) -> jboolean {
    let Some(path) = java_string(&mut env, &file_path) else {
        return JNI_FALSE;
    };
    to_jboolean(succeeded("loadState", host().load_state(&path)))
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_setCheat(
    mut env: JNIEnv,
    _thiz: JObject,
    index: jint,
    enabled: jboolean,
    code: JString,
) {
    let (Ok(index), Some(code)) = (u32::try_from(index), java_string(&mut env, &code)) else {
        tracing::warn!("setCheat: ignoring invalid cheat {index}");
        return;
    };
    succeeded("setCheat", host().set_cheat(index, enabled != JNI_FALSE, &code));
}

#[unsafe(no_mangle)]
pub extern "system" fn Java_com_blinkchase_nova_MainActivity_getNativeFps(
    _env: JNIEnv,
    _thiz: JObject,
) -> jint {
    jint::try_from(host().native_fps()).unwrap_or(60)
}
