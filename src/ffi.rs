//! FFI bindings for typescope
//!
//! This module provides C-compatible functions for calling the engine from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `typescope_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::AnalysisError;
use crate::pipeline::{analyze_json, AnalysisProcessor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Run `op` on the input string, mapping any failure to NULL + last error
unsafe fn with_input(
    json: *const c_char,
    op: impl FnOnce(&str) -> Result<String, AnalysisError>,
) -> *mut c_char {
    clear_last_error();

    let Some(input) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return ptr::null_mut();
    };

    match op(&input) {
        Ok(output) => string_to_cstr(&output),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Analyze a wire record and return the bare analysis result JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `typescope_free_string`.
/// - Returns NULL on error; call `typescope_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn typescope_analyze(json: *const c_char) -> *mut c_char {
    with_input(json, |input| {
        let result = analyze_json(input)?;
        serde_json::to_string(&result).map_err(AnalysisError::encoding)
    })
}

/// Analyze a wire record and return the full report envelope JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `typescope_free_string`.
/// - Returns NULL on error; call `typescope_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn typescope_report(json: *const c_char) -> *mut c_char {
    with_input(json, |input| AnalysisProcessor::new().process(input))
}

/// Free a string returned by typescope functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a typescope function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn typescope_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message.
///
/// # Safety
/// - The returned pointer is valid until the next typescope call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn typescope_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn typescope_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> CString {
        CString::new(
            r#"{"base_time": 1705327200000, "events": [
                [0, "i", "src/main.py", 12],
                [1500, "i", "src/main.py", 4],
                [4000, "d", "src/main.py", 2],
                [400000, "i", "src/util.py", 250]
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_analyze() {
        let input = sample_record();
        unsafe {
            let result = typescope_analyze(input.as_ptr());
            assert!(!result.is_null());

            let json = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(json).unwrap();
            assert!(value["overall_score"].is_number());
            assert_eq!(value["file_risks"]["util.py"]["risk"], "high");
            assert!(typescope_last_error().is_null());

            typescope_free_string(result);
        }
    }

    #[test]
    fn test_ffi_report() {
        let input = sample_record();
        unsafe {
            let result = typescope_report(input.as_ptr());
            assert!(!result.is_null());

            let json = CStr::from_ptr(result).to_str().unwrap();
            let value: serde_json::Value = serde_json::from_str(json).unwrap();
            assert_eq!(value["producer"]["name"], "typescope");
            assert_eq!(value["summary"]["total_events"], 4);

            typescope_free_string(result);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let bad = CString::new(r#"{"base_time": 0, "events": [[0, "i"]]}"#).unwrap();
        unsafe {
            let result = typescope_analyze(bad.as_ptr());
            assert!(result.is_null());

            let error = typescope_last_error();
            assert!(!error.is_null());
            let message = CStr::from_ptr(error).to_str().unwrap();
            assert!(message.contains("index 0"));
        }
    }

    #[test]
    fn test_ffi_null_input() {
        unsafe {
            assert!(typescope_report(ptr::null()).is_null());
            let message = CStr::from_ptr(typescope_last_error()).to_str().unwrap();
            assert_eq!(message, "Invalid JSON string pointer");
        }
    }

    #[test]
    fn test_ffi_error_cleared_on_success() {
        let bad = CString::new("not json").unwrap();
        let good = sample_record();
        unsafe {
            assert!(typescope_analyze(bad.as_ptr()).is_null());
            assert!(!typescope_last_error().is_null());

            let result = typescope_analyze(good.as_ptr());
            assert!(typescope_last_error().is_null());
            typescope_free_string(result);
        }
    }

    #[test]
    fn test_version() {
        unsafe {
            let version = CStr::from_ptr(typescope_version()).to_str().unwrap();
            assert_eq!(version, env!("CARGO_PKG_VERSION"));
        }
    }
}
