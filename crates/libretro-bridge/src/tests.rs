use super::*;
use once_cell::sync::Lazy;
use std::{
    ffi::{CStr, c_char, c_uint, c_void},
    slice,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicUsize, Ordering},
    },
};

static TEST_LOCK: Mutex<()> = Mutex::new(());
static EVENTS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(Vec::new()));
static LOADED: Lazy<Mutex<Option<(String, usize)>>> = Lazy::new(|| Mutex::new(None));
static INSTALLED: AtomicUsize = AtomicUsize::new(0);
static VIDEO_CB: Mutex<raw::retro_video_refresh_t> = Mutex::new(None);

fn serial() -> MutexGuard<'static, ()> {
    let guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    EVENTS.lock().unwrap().clear();
    *LOADED.lock().unwrap() = None;
    INSTALLED.store(0, Ordering::SeqCst);
    *VIDEO_CB.lock().unwrap() = None;
    guard
}

fn log(event: impl Into<String>) {
    EVENTS.lock().unwrap().push(event.into());
}

fn events() -> Vec<String> {
    EVENTS.lock().unwrap().clone()
}

unsafe extern "C" fn mock_init() {
    log("init");
}

unsafe extern "C" fn mock_deinit() {
    log("deinit");
}

unsafe extern "C" fn mock_run() {
    log("run");
    if let Some(video) = *VIDEO_CB.lock().unwrap() {
        static FRAME: [u16; 4] = [1, 2, 3, 4];
        unsafe { video(FRAME.as_ptr() as *const c_void, 2, 2, 4) };
    }
}

unsafe extern "C" fn mock_reset() {
    log("reset");
}

unsafe extern "C" fn mock_load_game(game: *const raw::retro_game_info) -> bool {
    let game = unsafe { &*game };
    if game.path.is_null() {
        return false;
    }
    let path = unsafe { CStr::from_ptr(game.path) }
        .to_string_lossy()
        .into_owned();
    *LOADED.lock().unwrap() = Some((path, game.size));
    log("load");
    true
}

unsafe extern "C" fn mock_unload_game() {
    log("unload");
}

unsafe extern "C" fn mock_system_info(info: *mut raw::retro_system_info) {
    let info = unsafe { &mut *info };
    info.library_name = c"MockCore".as_ptr();
    info.library_version = c"0.3".as_ptr();
    info.valid_extensions = c"bin|rom".as_ptr();
    info.need_fullpath = true;
}

unsafe extern "C" fn mock_serialize_size() -> usize {
    8
}

unsafe extern "C" fn mock_serialize(data: *mut c_void, size: usize) -> bool {
    if size < 8 {
        return false;
    }
    let dst = unsafe { slice::from_raw_parts_mut(data as *mut u8, size) };
    dst[..8].copy_from_slice(&0xDEADBEEFu64.to_le_bytes());
    true
}

unsafe extern "C" fn mock_unserialize(data: *const c_void, size: usize) -> bool {
    let src = unsafe { slice::from_raw_parts(data as *const u8, size) };
    log(format!("unserialize({size})"));
    size >= 8 && src[..8] == 0xDEADBEEFu64.to_le_bytes()
}

unsafe extern "C" fn mock_cheat_set(index: c_uint, enabled: bool, code: *const c_char) {
    let code = unsafe { CStr::from_ptr(code) }.to_string_lossy();
    log(format!("cheat({index},{enabled},{code})"));
}

unsafe extern "C" fn mock_cheat_reset() {
    log("cheat-reset");
}

unsafe extern "C" fn mock_set_video(cb: raw::retro_video_refresh_t) {
    INSTALLED.fetch_add(1, Ordering::SeqCst);
    *VIDEO_CB.lock().unwrap() = cb;
}

unsafe extern "C" fn mock_set_input_poll(_cb: raw::retro_input_poll_t) {
    INSTALLED.fetch_add(1, Ordering::SeqCst);
}

static FRAMES: AtomicUsize = AtomicUsize::new(0);

unsafe extern "C" fn host_video(_data: *const c_void, width: c_uint, height: c_uint, pitch: usize) {
    assert_eq!((width, height, pitch), (2, 2, 4));
    FRAMES.fetch_add(1, Ordering::SeqCst);
}

fn full_table() -> CoreSymbols {
    CoreSymbols {
        init: Some(mock_init),
        load_game: Some(mock_load_game),
        run: Some(mock_run),
        deinit: Some(mock_deinit),
        unload_game: Some(mock_unload_game),
        reset: Some(mock_reset),
        get_system_info: Some(mock_system_info),
        serialize_size: Some(mock_serialize_size),
        serialize: Some(mock_serialize),
        unserialize: Some(mock_unserialize),
        cheat_reset: Some(mock_cheat_reset),
        cheat_set: Some(mock_cheat_set),
        set_video_refresh: Some(mock_set_video),
        set_input_poll: Some(mock_set_input_poll),
        ..CoreSymbols::default()
    }
}

fn minimal_table() -> CoreSymbols {
    CoreSymbols {
        init: Some(mock_init),
        load_game: Some(mock_load_game),
        run: Some(mock_run),
        ..CoreSymbols::default()
    }
}

#[test]
fn core_delegates_to_entry_points() {
    let _guard = serial();
    FRAMES.store(0, Ordering::SeqCst);

    let mut core = unsafe { Core::from_symbols(full_table()) }.unwrap();
    core.install_callbacks(&CallbackSet::default().with_video(Some(host_video)));
    assert_eq!(INSTALLED.load(Ordering::SeqCst), 2);

    core.init();
    core.init();

    let info = core.system_info().unwrap();
    assert_eq!(info.library_name, "MockCore");
    assert_eq!(info.library_version, "0.3");
    assert_eq!(info.valid_extensions.as_deref(), Some("bin|rom"));
    assert!(info.need_fullpath);

    let rom = [0xAAu8; 16];
    let game = GameInfo::from_path(c"/roms/demo.bin").with_data(&rom);
    assert!(core.load_game(&game));
    assert_eq!(
        LOADED.lock().unwrap().clone(),
        Some(("/roms/demo.bin".to_string(), 16))
    );

    core.run();
    core.run();
    assert_eq!(FRAMES.load(Ordering::SeqCst), 2);

    assert!(core.reset());
    core.unload_game();
    drop(core);

    assert_eq!(
        events(),
        ["init", "load", "run", "run", "reset", "unload", "deinit"]
    );
}

#[test]
fn mock_core_refuses_content_without_a_path() {
    let _guard = serial();
    let game = raw::retro_game_info {
        path: std::ptr::null(),
        data: std::ptr::null(),
        size: 0,
        meta: std::ptr::null(),
    };
    assert!(!unsafe { mock_load_game(&game) });
    assert_eq!(*LOADED.lock().unwrap(), None);
    assert!(events().is_empty());
}

#[test]
fn save_state_entry_points() {
    let _guard = serial();
    let core = unsafe { Core::from_symbols(full_table()) }.unwrap();

    assert_eq!(core.serialize_size(), Some(8));
    let mut state = [0u8; 8];
    core.serialize(&mut state).unwrap();
    assert_eq!(state, 0xDEADBEEFu64.to_le_bytes());

    let mut short = [0u8; 4];
    assert_eq!(core.serialize(&mut short), Err(SerializeError::Rejected));

    core.unserialize(&state).unwrap();
    assert_eq!(core.unserialize(&[0u8; 8]), Err(SerializeError::Rejected));
}

#[test]
fn cheat_entry_points() {
    let _guard = serial();
    let core = unsafe { Core::from_symbols(full_table()) }.unwrap();

    assert!(core.cheat_set(3, true, c"ABCD-1234"));
    core.cheat_reset();
    assert_eq!(events(), ["cheat(3,true,ABCD-1234)", "cheat-reset"]);
}

#[test]
fn optional_entry_points_degrade() {
    let _guard = serial();
    let core = unsafe { Core::from_symbols(minimal_table()) }.unwrap();

    assert_eq!(core.system_info(), None);
    assert_eq!(core.serialize_size(), None);
    assert_eq!(core.serialize(&mut [0u8; 8]), Err(SerializeError::Unsupported));
    assert_eq!(core.unserialize(&[0u8; 8]), Err(SerializeError::Unsupported));
    assert!(!core.reset());
    assert!(!core.cheat_set(0, true, c"X"));
    core.cheat_reset();
    core.unload_game();
    core.install_callbacks(&CallbackSet::default());

    // Never initialised, so no deinit either.
    drop(core);
    assert!(events().is_empty());
}

#[test]
fn incomplete_table_is_rejected() {
    let _guard = serial();
    let symbols = CoreSymbols {
        run: None,
        ..minimal_table()
    };
    assert_eq!(symbols.missing_required(), Some("retro_run"));

    let err = unsafe { Core::from_symbols(symbols) }.err().unwrap();
    assert!(matches!(
        err,
        CoreLoadError::IncompleteTable {
            symbol: "retro_run"
        }
    ));
    assert_eq!(CoreSymbols::default().missing_required(), Some("retro_init"));
}

#[test]
fn open_reports_missing_library() {
    let _guard = serial();
    let err = unsafe { Core::open("/nonexistent/dir/missing_libretro.so") }
        .err()
        .unwrap();
    match err {
        CoreLoadError::Open { path, .. } => {
            assert_eq!(path.to_str(), Some("/nonexistent/dir/missing_libretro.so"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
