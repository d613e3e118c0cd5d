use std::{
    ffi::{CStr, CString},
    path::PathBuf,
};

use crate::types::HostError;

/// System and save directories handed to the core as C strings.
///
/// A core may keep the pointers it was given for as long as it is resident,
/// so strings replaced while a core is loaded are retired instead of freed
/// and only released by [`core_unloaded`](Self::core_unloaded).
#[derive(Default)]
pub(crate) struct Directories {
    system: Option<CString>,
    save: Option<CString>,
    retired: Vec<CString>,
    core_resident: bool,
}

impl Directories {
    pub(crate) fn set(&mut self, system: &str, save: &str) -> Result<(), HostError> {
        let system = to_c_string(system)?;
        let save = to_c_string(save)?;

        let old = [self.system.replace(system), self.save.replace(save)];
        if self.core_resident {
            self.retired.extend(old.into_iter().flatten());
        }
        Ok(())
    }

    /// `None` until a non-empty system directory has been set.
    pub(crate) fn system_ptr(&self) -> Option<*const std::ffi::c_char> {
        non_empty(self.system.as_deref())
    }

    pub(crate) fn save_ptr(&self) -> Option<*const std::ffi::c_char> {
        non_empty(self.save.as_deref())
    }

    pub(crate) fn core_loaded(&mut self) {
        self.core_resident = true;
    }

    pub(crate) fn core_unloaded(&mut self) {
        self.core_resident = false;
        self.retired.clear();
    }

    #[cfg(test)]
    fn retired(&self) -> usize {
        self.retired.len()
    }
}

fn non_empty(dir: Option<&CStr>) -> Option<*const std::ffi::c_char> {
    dir.filter(|dir| !dir.is_empty()).map(CStr::as_ptr)
}

fn to_c_string(dir: &str) -> Result<CString, HostError> {
    CString::new(dir).map_err(|_| HostError::InvalidPath(PathBuf::from(dir)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strings_given_to_a_resident_core_stay_alive() {
        let mut dirs = Directories::default();
        dirs.set("/sys/a", "/save/a").unwrap();
        dirs.set("/sys/b", "/save/b").unwrap();
        assert_eq!(dirs.retired(), 0);

        dirs.core_loaded();
        let handed_out = dirs.system_ptr().unwrap();
        dirs.set("/sys/c", "/save/c").unwrap();
        assert_eq!(dirs.retired(), 2);
        assert_eq!(
            unsafe { std::ffi::CStr::from_ptr(handed_out) },
            c"/sys/b"
        );

        dirs.core_unloaded();
        assert_eq!(dirs.retired(), 0);
        assert_eq!(
            unsafe { std::ffi::CStr::from_ptr(dirs.save_ptr().unwrap()) },
            c"/save/c"
        );
    }

    #[test]
    fn empty_directories_count_as_unset() {
        let mut dirs = Directories::default();
        dirs.set("", "/save").unwrap();
        assert_eq!(dirs.system_ptr(), None);
        assert!(dirs.save_ptr().is_some());

        dirs.set("/sys", "").unwrap();
        assert!(dirs.system_ptr().is_some());
        assert_eq!(dirs.save_ptr(), None);
    }

    #[test]
    fn interior_nul_is_rejected() {
        let mut dirs = Directories::default();
        assert!(matches!(
            dirs.set("/sys\0x", "/save"),
            Err(HostError::InvalidPath(_))
        ));
        assert_eq!(dirs.system_ptr(), None);
    }
}
