//! FFI bindings for the VYR engine
//!
//! C-compatible entry points so the mobile apps can call the engine directly.
//! Every function takes and returns null-terminated JSON strings; returned
//! strings are allocated here and must be released with `vyr_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::EngineError;
use crate::normalizer::normalize_hrv_ms_to_index;
use crate::pipeline::{compute_baseline_json, compute_state_json};
use crate::types::RawSample;
use crate::validator::validate_with_report;

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

/// Read a required C string argument
unsafe fn read_arg(ptr: *const c_char, name: &str) -> Result<String, EngineError> {
    if ptr.is_null() {
        return Err(EngineError::Ffi(format!("{} is a null pointer", name)));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(|s| s.to_string())
        .map_err(|_| EngineError::Ffi(format!("{} is not valid UTF-8", name)))
}

/// Read an optional C string argument (NULL means absent)
unsafe fn read_optional_arg(ptr: *const c_char, name: &str) -> Result<Option<String>, EngineError> {
    if ptr.is_null() {
        Ok(None)
    } else {
        read_arg(ptr, name).map(Some)
    }
}

/// Hand a result to C: the string on success, NULL plus last error on failure
fn into_c_result(result: Result<String, EngineError>) -> *mut c_char {
    match result {
        Ok(json) => match CString::new(json) {
            Ok(cstr) => cstr.into_raw(),
            Err(_) => {
                set_last_error("Output contained an interior NUL byte");
                ptr::null_mut()
            }
        },
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Engine API
// ============================================================================

/// Validate one raw sample.
///
/// Returns `{"sample": <validated sample>, "qualityFlags": [...]}`.
///
/// # Safety
/// - `sample_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `vyr_free_string`.
/// - Returns NULL on error; call `vyr_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vyr_validate_sample(sample_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let result = read_arg(sample_json, "sample_json").and_then(|json| {
        let raw = RawSample::from_json(&json)?;
        let (sample, flags) = validate_with_report(&raw);
        let report = serde_json::json!({ "sample": sample, "qualityFlags": flags });
        Ok(report.to_string())
    });
    into_c_result(result)
}

/// Compute a personal baseline from a JSON array of raw samples.
///
/// # Safety
/// - `history_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `vyr_free_string`.
/// - Returns NULL on error; call `vyr_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vyr_compute_baseline(history_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let result = read_arg(history_json, "history_json").and_then(|json| compute_baseline_json(&json));
    into_c_result(result)
}

/// Compute the full state for one sample.
///
/// # Safety
/// - `sample_json` and `context_json` must be valid null-terminated C strings.
/// - `baseline_json` may be NULL to use the fallback baseline.
/// - Returns a newly allocated string that must be freed with `vyr_free_string`.
/// - Returns NULL on error; call `vyr_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vyr_compute_state(
    sample_json: *const c_char,
    baseline_json: *const c_char,
    context_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let result = (|| {
        let sample = read_arg(sample_json, "sample_json")?;
        let baseline = read_optional_arg(baseline_json, "baseline_json")?;
        let context = read_arg(context_json, "context_json")?;
        compute_state_json(&sample, baseline.as_deref(), &context)
    })();
    into_c_result(result)
}

/// Map raw HRV milliseconds onto the 0-100 index.
#[no_mangle]
pub extern "C" fn vyr_normalize_hrv_ms(ms: f64) -> f64 {
    normalize_hrv_ms_to_index(ms)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by VYR functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a VYR function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vyr_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next VYR function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn vyr_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the engine version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn vyr_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
