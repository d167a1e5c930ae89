// Raw C signatures of the plugin entry points, grouped by shape.
use std::ffi::{c_char, c_int, c_void};

pub type StatusFn = unsafe extern "C" fn(*mut c_void, *mut i32);
pub type OpenFn = unsafe extern "C" fn(*mut c_void, *const c_char, *mut i32) -> c_int;
pub type CloseFn = unsafe extern "C" fn(*mut c_void, *mut i32) -> c_int;
pub type SetOptionFn = unsafe extern "C" fn(*mut c_void, u32, *const c_void, u32, *mut i32);
pub type GetValueFn = unsafe extern "C" fn(*mut c_void, u32, *mut c_void, *mut u32, *mut i32);
pub type ExtensionsFn = unsafe extern "C" fn(*mut c_void, *mut u32) -> *const *const c_char;
pub type SetLanguageFn = unsafe extern "C" fn(*mut c_void, c_int, *mut i32);

pub type DecodeFrameFn = unsafe extern "C" fn(*mut c_void, u32, *mut *mut u8, *mut u32, *mut i32);
pub type DestroyFrameFn = unsafe extern "C" fn(*mut c_void, u32, *mut u8, u32);
pub type EncodeFrameFn = unsafe extern "C" fn(*mut c_void, u32, *const u8, u32, *mut i32);

pub type CompileFileFn = unsafe extern "C" fn(*mut c_void, *const c_char, *mut u32) -> *mut u8;
pub type CompileSourceFn =
    unsafe extern "C" fn(*mut c_void, *const c_char, u32, *mut u32) -> *mut u8;
pub type AddIncludeSourceFn = unsafe extern "C" fn(*mut c_void, *const c_char, *const u8, u32);
pub type DestroyBinaryFn = unsafe extern "C" fn(*mut c_void, *mut u8, u32);

pub type DescribeFn = unsafe extern "C" fn(*const c_void) -> *const c_char;
pub type CountFunctionsFn = unsafe extern "C" fn(*const c_void) -> c_int;
pub type FunctionNameFn = unsafe extern "C" fn(*const c_void, c_int) -> *const c_char;
pub type SetFunctionFn = unsafe extern "C" fn(*mut c_void, c_int, *mut i32);
pub type SetIndicesFn = unsafe extern "C" fn(*mut c_void, *const c_int, u32, *mut i32);
pub type SetFramesFn = unsafe extern "C" fn(*mut c_void, *const u32, u32, *mut i32);
pub type SetNamedFramesFn =
    unsafe extern "C" fn(*mut c_void, *const c_char, *const u32, u32, *mut i32);
pub type SetBytesFn = unsafe extern "C" fn(*mut c_void, *const u8, u32, *mut i32);
pub type SetFlagFn = unsafe extern "C" fn(*mut c_void, c_int);

pub type DataSizeFn = unsafe extern "C" fn(*mut c_void, *mut u32);
pub type ReadDataFn = unsafe extern "C" fn(*mut c_void, *mut u8, u32, *mut i32);
pub type SetComponentLayoutFn =
    unsafe extern "C" fn(*mut c_void, *const c_char, *const u8, u32, *mut c_int, *mut i32);
