// In-process fixture plugins for all five categories, served through `StaticLoader`.
//
// Call counters and the live-allocation tally are thread-local: every test runs
// on its own thread and plugin calls never leave it.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ffi::{CStr, c_char, c_int, c_void};
use std::sync::Arc;

use emplug::api::{Category, HostOptions, PluginFactory, StaticBundle, StaticLoader};

pub const ABI_2_0: u32 = 0x0002_0000;
pub const ABI_2_1: u32 = 0x0002_0001;

pub const DECODER_PATH: &str = "/plugins/libfixture_decoder.so";
pub const ENCODER_PATH: &str = "/plugins/libfixture_encoder.so";
pub const EFFECT_PATH: &str = "/plugins/libfixture_effect.so";
pub const MODEL_PATH: &str = "/plugins/libfixture_model.so";
pub const MOTION_PATH: &str = "/plugins/libfixture_motion.so";

pub const FAILURE_REASON: &str = "fixture cannot handle this input";
pub const RECOVERY_SUGGESTION: &str = "try a file the fixture understands";

/// Frames at or past this index still allocate but report `ERROR_REFER_REASON`.
pub const LAST_FRAME: u32 = 600;

thread_local! {
    static CALLS: RefCell<HashMap<&'static str, usize>> = RefCell::new(HashMap::new());
    static LIVE_BYTES: Cell<i64> = const { Cell::new(0) };
    static REPORTED_ABI: Cell<u32> = const { Cell::new(ABI_2_0) };
    static LAST_TEXT: RefCell<String> = const { RefCell::new(String::new()) };
    static LAST_LEN: Cell<usize> = const { Cell::new(usize::MAX) };
    static INDEX_LENS: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

pub fn calls(name: &str) -> usize {
    CALLS.with(|calls| calls.borrow().get(name).copied().unwrap_or(0))
}

fn bump(name: &'static str) {
    CALLS.with(|calls| *calls.borrow_mut().entry(name).or_insert(0) += 1);
}

/// Bytes handed to the host and not yet returned through a destroy call.
pub fn live_bytes() -> i64 {
    LIVE_BYTES.with(Cell::get)
}

/// ABI version every fixture reports from now on, on this thread.
pub fn report_abi(raw: u32) {
    REPORTED_ABI.with(|abi| abi.set(raw));
}

/// Last string argument a fixture recorded (paths, track names, include names).
pub fn last_text() -> String {
    LAST_TEXT.with(|text| text.borrow().clone())
}

/// Length of the last index or keyframe list a fixture received.
pub fn last_len() -> usize {
    LAST_LEN.with(Cell::get)
}

/// Lengths of every index list a model fixture received, in call order.
pub fn index_lens() -> Vec<usize> {
    INDEX_LENS.with(|lens| lens.borrow().clone())
}

fn record_text(value: String) {
    LAST_TEXT.with(|text| *text.borrow_mut() = value);
}

fn record_len(len: u32) {
    LAST_LEN.with(|last| last.set(len as usize));
}

pub fn fixture_loader() -> StaticLoader {
    StaticLoader::new()
        .with_bundle(DECODER_PATH, decoder_bundle())
        .with_bundle(ENCODER_PATH, encoder_bundle())
        .with_bundle(EFFECT_PATH, effect_bundle())
        .with_bundle(MODEL_PATH, model_bundle())
        .with_bundle(MOTION_PATH, motion_bundle())
}

pub fn factory(loader: &StaticLoader) -> PluginFactory {
    factory_with(loader, HostOptions::default())
}

pub fn factory_with(loader: &StaticLoader, options: HostOptions) -> PluginFactory {
    PluginFactory::new(Arc::new(loader.clone()), options)
}

pub fn shared(loader: &StaticLoader) -> Arc<dyn emplug::api::Loader> {
    Arc::new(loader.clone())
}

// ---- shared plumbing ----

unsafe fn state<'a, T>(instance: *const c_void) -> &'a mut T {
    unsafe { &mut *(instance as *mut T) }
}

unsafe fn set_status(status: *mut i32, code: i32) {
    unsafe { *status = code };
}

unsafe fn text(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

unsafe fn bytes<'a>(ptr: *const u8, len: u32) -> &'a [u8] {
    if ptr.is_null() || len == 0 {
        return &[];
    }
    unsafe { std::slice::from_raw_parts(ptr, len as usize) }
}

fn hand_out(data: Vec<u8>) -> (*mut u8, u32) {
    if data.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let len = data.len() as u32;
    LIVE_BYTES.with(|live| live.set(live.get() + i64::from(len)));
    (Box::into_raw(data.into_boxed_slice()).cast::<u8>(), len)
}

unsafe fn take_back(ptr: *mut u8, len: u32) {
    if ptr.is_null() {
        return;
    }
    let slice = std::ptr::slice_from_raw_parts_mut(ptr, len as usize);
    drop(unsafe { Box::from_raw(slice) });
    LIVE_BYTES.with(|live| live.set(live.get() - i64::from(len)));
}

unsafe fn read_word(value: *const c_void, size: u32) -> Option<u32> {
    if value.is_null() || size != 4 {
        return None;
    }
    Some(unsafe { *(value as *const u32) })
}

unsafe fn write_output(output: &[u8], data: *mut u8, len: u32, status: *mut i32) {
    if (len as usize) < output.len() {
        unsafe { set_status(status, -1) };
        return;
    }
    unsafe { std::ptr::copy_nonoverlapping(output.as_ptr(), data, output.len()) };
}

fn publish(list: &mut Vec<*const c_char>, items: &[&'static CStr], len: *mut u32) -> *const *const c_char {
    *list = items.iter().map(|item| item.as_ptr()).collect();
    unsafe { *len = list.len() as u32 };
    if list.is_empty() {
        std::ptr::null()
    } else {
        list.as_ptr()
    }
}

unsafe extern "C" fn abi_version() -> u32 {
    REPORTED_ABI.with(Cell::get)
}

unsafe extern "C" fn initialize() {
    bump("initialize");
}

unsafe extern "C" fn terminate() {
    bump("terminate");
}

unsafe extern "C" fn create<T: Default>() -> *mut c_void {
    bump("create");
    Box::into_raw(Box::<T>::default()).cast()
}

unsafe extern "C" fn create_with_location<T: Default>(location: *const c_char) -> *mut c_void {
    bump("create_with_location");
    record_text(unsafe { text(location) });
    Box::into_raw(Box::<T>::default()).cast()
}

unsafe extern "C" fn destroy<T>(instance: *mut c_void) {
    bump("destroy");
    if !instance.is_null() {
        drop(unsafe { Box::from_raw(instance.cast::<T>()) });
    }
}

unsafe extern "C" fn failure_reason(_: *const c_void) -> *const c_char {
    bump("failure_reason");
    c"fixture cannot handle this input".as_ptr()
}

unsafe extern "C" fn recovery_suggestion(_: *const c_void) -> *const c_char {
    bump("recovery_suggestion");
    c"try a file the fixture understands".as_ptr()
}

struct Symbols {
    prefix: &'static str,
    bundle: StaticBundle,
}

impl Symbols {
    fn base<T: Default>(category: Category) -> Self {
        let symbols = Self {
            prefix: category.symbol_prefix(),
            bundle: StaticBundle::new(),
        };
        symbols
            .with("GetABIVersion", abi_version as *const c_void)
            .with("Initialize", initialize as *const c_void)
            .with("Create", create::<T> as *const c_void)
            .with("Destroy", destroy::<T> as *const c_void)
            .with("GetFailureReason", failure_reason as *const c_void)
            .with("GetRecoverySuggestion", recovery_suggestion as *const c_void)
            .with("Terminate", terminate as *const c_void)
    }

    fn with(mut self, suffix: &str, address: *const c_void) -> Self {
        self.bundle.insert(format!("{}{suffix}", self.prefix), address);
        self
    }

    fn finish(self) -> StaticBundle {
        self.bundle
    }
}

// ---- decoder ----

#[derive(Default)]
pub struct DecoderState {
    fps: u32,
    opened: bool,
    extensions: Vec<*const c_char>,
}

unsafe extern "C" fn decoder_open(instance: *mut c_void, path: *const c_char, status: *mut i32) -> c_int {
    bump("open");
    let state = unsafe { state::<DecoderState>(instance) };
    let path = unsafe { text(path) };
    record_text(path.clone());
    if path.ends_with(".wav") {
        state.opened = true;
        return 1;
    }
    if path.contains("broken") {
        unsafe { set_status(status, -3) };
    }
    0
}

unsafe extern "C" fn decoder_set_option(
    instance: *mut c_void,
    key: u32,
    value: *const c_void,
    size: u32,
    status: *mut i32,
) {
    bump("set_option");
    let state = unsafe { state::<DecoderState>(instance) };
    match key {
        0 => match unsafe { read_word(value, size) } {
            Some(fps) => state.fps = fps,
            None => unsafe { set_status(status, -1) },
        },
        1 | 2 => {}
        _ => unsafe { set_status(status, -2) },
    }
}

unsafe extern "C" fn decoder_audio_format(
    instance: *mut c_void,
    key: u32,
    value: *mut c_void,
    size: *mut u32,
    status: *mut i32,
) {
    let state = unsafe { state::<DecoderState>(instance) };
    let answer = match key {
        0 => 16,
        1 => 2,
        2 => 44_100,
        3 if state.opened => 120,
        3 => 0,
        _ => {
            unsafe { set_status(status, -2) };
            return;
        }
    };
    unsafe {
        *(value as *mut u32) = answer;
        *size = 4;
    }
}

unsafe extern "C" fn decoder_video_format(
    _: *mut c_void,
    _: u32,
    _: *mut c_void,
    _: *mut u32,
    status: *mut i32,
) {
    unsafe { set_status(status, -2) };
}

unsafe extern "C" fn decoder_decode_audio(
    instance: *mut c_void,
    index: u32,
    data: *mut *mut u8,
    size: *mut u32,
    status: *mut i32,
) {
    bump("decode_audio_frame");
    let state = unsafe { state::<DecoderState>(instance) };
    let samples = 44_100 / state.fps.max(1);
    let frame = vec![(index % 251) as u8; samples as usize * 4];
    let (ptr, len) = hand_out(frame);
    unsafe {
        *data = ptr;
        *size = len;
    }
    if index >= LAST_FRAME {
        unsafe { set_status(status, -3) };
    }
}

unsafe extern "C" fn decoder_decode_video(
    _: *mut c_void,
    _: u32,
    data: *mut *mut u8,
    size: *mut u32,
    status: *mut i32,
) {
    bump("decode_video_frame");
    unsafe {
        *data = std::ptr::null_mut();
        *size = 0;
        set_status(status, -3);
    }
}

unsafe extern "C" fn decoder_destroy_frame(_: *mut c_void, _: u32, data: *mut u8, size: u32) {
    bump("destroy_frame");
    unsafe { take_back(data, size) };
}

unsafe extern "C" fn decoder_audio_extensions(instance: *mut c_void, len: *mut u32) -> *const *const c_char {
    let state = unsafe { state::<DecoderState>(instance) };
    publish(&mut state.extensions, &[c"wav", c".AIFF"], len)
}

unsafe extern "C" fn decoder_video_extensions(instance: *mut c_void, len: *mut u32) -> *const *const c_char {
    let state = unsafe { state::<DecoderState>(instance) };
    publish(&mut state.extensions, &[], len)
}

unsafe extern "C" fn decoder_close(instance: *mut c_void, _: *mut i32) -> c_int {
    bump("close");
    let state = unsafe { state::<DecoderState>(instance) };
    state.opened = false;
    1
}

pub fn decoder_bundle() -> StaticBundle {
    Symbols::base::<DecoderState>(Category::Decoder)
        .with("Open", decoder_open as *const c_void)
        .with("SetOption", decoder_set_option as *const c_void)
        .with("GetAudioFormatValue", decoder_audio_format as *const c_void)
        .with("GetVideoFormatValue", decoder_video_format as *const c_void)
        .with("DecodeAudioFrame", decoder_decode_audio as *const c_void)
        .with("DecodeVideoFrame", decoder_decode_video as *const c_void)
        .with("DestroyAudioFrame", decoder_destroy_frame as *const c_void)
        .with("DestroyVideoFrame", decoder_destroy_frame as *const c_void)
        .with("GetAllAvailableAudioFormatExtensions", decoder_audio_extensions as *const c_void)
        .with("GetAllAvailableVideoFormatExtensions", decoder_video_extensions as *const c_void)
        .with("Close", decoder_close as *const c_void)
        .finish()
}

// ---- encoder ----

#[derive(Default)]
pub struct EncoderState {
    extensions: Vec<*const c_char>,
}

unsafe extern "C" fn encoder_open(_: *mut c_void, path: *const c_char, _: *mut i32) -> c_int {
    bump("open");
    record_text(unsafe { text(path) });
    1
}

unsafe extern "C" fn encoder_set_option(
    _: *mut c_void,
    key: u32,
    _: *const c_void,
    _: u32,
    status: *mut i32,
) {
    bump("set_option");
    if key > 9 {
        unsafe { set_status(status, -2) };
    }
}

unsafe extern "C" fn encoder_encode_audio(_: *mut c_void, _: u32, _: *const u8, _: u32, _: *mut i32) {
    bump("encode_audio_frame");
}

unsafe extern "C" fn encoder_encode_video(_: *mut c_void, _: u32, data: *const u8, size: u32, status: *mut i32) {
    bump("encode_video_frame");
    if unsafe { bytes(data, size) }.is_empty() {
        unsafe { set_status(status, -1) };
    }
}

unsafe extern "C" fn encoder_interrupt(_: *mut c_void, _: *mut i32) {
    bump("interrupt");
}

unsafe extern "C" fn encoder_video_extensions(instance: *mut c_void, len: *mut u32) -> *const *const c_char {
    let state = unsafe { state::<EncoderState>(instance) };
    publish(&mut state.extensions, &[c"mp4", c"mov"], len)
}

unsafe extern "C" fn encoder_close(_: *mut c_void, _: *mut i32) -> c_int {
    bump("close");
    1
}

unsafe extern "C" fn layout_load(_: *mut c_void, _: *mut i32) {
    bump("load_ui_window_layout");
}

unsafe extern "C" fn layout_size(_: *mut c_void, size: *mut u32) {
    unsafe { *size = 4 };
}

unsafe extern "C" fn layout_data(_: *mut c_void, data: *mut u8, len: u32, status: *mut i32) {
    unsafe { write_output(b"LAY1", data, len, status) };
}

unsafe extern "C" fn layout_set_component(
    _: *mut c_void,
    id: *const c_char,
    _: *const u8,
    _: u32,
    reload: *mut c_int,
    _: *mut i32,
) {
    let id = unsafe { text(id) };
    unsafe { *reload = c_int::from(id == "codec") };
    record_text(id);
}

pub fn encoder_bundle() -> StaticBundle {
    Symbols::base::<EncoderState>(Category::Encoder)
        .with("Open", encoder_open as *const c_void)
        .with("SetOption", encoder_set_option as *const c_void)
        .with("EncodeAudioFrame", encoder_encode_audio as *const c_void)
        .with("EncodeVideoFrame", encoder_encode_video as *const c_void)
        .with("Interrupt", encoder_interrupt as *const c_void)
        .with("GetAllAvailableVideoFormatExtensions", encoder_video_extensions as *const c_void)
        .with("Close", encoder_close as *const c_void)
        .with("LoadUIWindowLayout", layout_load as *const c_void)
        .with("GetUIWindowLayoutDataSize", layout_size as *const c_void)
        .with("GetUIWindowLayoutData", layout_data as *const c_void)
        .with("SetUIComponentLayoutData", layout_set_component as *const c_void)
        .finish()
}

// ---- effect compiler ----

#[derive(Default)]
pub struct EffectState {
    options: HashMap<u32, u32>,
    includes: Vec<String>,
    extensions: Vec<*const c_char>,
}

unsafe extern "C" fn effect_get_option(
    instance: *mut c_void,
    key: u32,
    value: *mut c_void,
    size: *mut u32,
    status: *mut i32,
) {
    let state = unsafe { state::<EffectState>(instance) };
    match state.options.get(&key) {
        Some(stored) => unsafe {
            *(value as *mut u32) = *stored;
            *size = 4;
        },
        None => unsafe { set_status(status, -2) },
    }
}

unsafe extern "C" fn effect_set_option(
    instance: *mut c_void,
    key: u32,
    value: *const c_void,
    size: u32,
    status: *mut i32,
) {
    bump("set_option");
    let state = unsafe { state::<EffectState>(instance) };
    if key > 7 {
        unsafe { set_status(status, -2) };
        return;
    }
    match unsafe { read_word(value, size) } {
        Some(word) => {
            state.options.insert(key, word);
        }
        None => unsafe { set_status(status, -1) },
    }
}

unsafe extern "C" fn effect_extensions(instance: *mut c_void, len: *mut u32) -> *const *const c_char {
    let state = unsafe { state::<EffectState>(instance) };
    publish(&mut state.extensions, &[c"fx", c"fxsub"], len)
}

unsafe extern "C" fn effect_compile_file(_: *mut c_void, path: *const c_char, size: *mut u32) -> *mut u8 {
    bump("create_binary_from_file");
    let path = unsafe { text(path) };
    if !path.ends_with(".fx") {
        unsafe { *size = 0 };
        return std::ptr::null_mut();
    }
    let (ptr, len) = hand_out(format!("BIN:{path}").into_bytes());
    unsafe { *size = len };
    ptr
}

unsafe extern "C" fn effect_compile_source(
    instance: *mut c_void,
    source: *const c_char,
    _: u32,
    size: *mut u32,
) -> *mut u8 {
    bump("create_binary_from_memory");
    let state = unsafe { state::<EffectState>(instance) };
    let source = unsafe { text(source) };
    let resolvable = !source.contains("#include") || !state.includes.is_empty();
    if !source.contains("technique") || !resolvable {
        unsafe { *size = 0 };
        return std::ptr::null_mut();
    }
    let (ptr, len) = hand_out(format!("BIN:{}", source.len()).into_bytes());
    unsafe { *size = len };
    ptr
}

unsafe extern "C" fn effect_add_include(instance: *mut c_void, path: *const c_char, _: *const u8, _: u32) {
    bump("add_include_source");
    let state = unsafe { state::<EffectState>(instance) };
    let path = unsafe { text(path) };
    record_text(path.clone());
    state.includes.push(path);
}

unsafe extern "C" fn effect_destroy_binary(_: *mut c_void, data: *mut u8, size: u32) {
    bump("destroy_binary");
    unsafe { take_back(data, size) };
}

pub fn effect_bundle() -> StaticBundle {
    Symbols::base::<EffectState>(Category::EffectCompiler)
        .with("GetOption", effect_get_option as *const c_void)
        .with("SetOption", effect_set_option as *const c_void)
        .with("GetAvailableExtensions", effect_extensions as *const c_void)
        .with("CreateBinaryFromFile", effect_compile_file as *const c_void)
        .with("CreateBinaryFromMemory", effect_compile_source as *const c_void)
        .with("AddIncludeSource", effect_add_include as *const c_void)
        .with("DestroyBinary", effect_destroy_binary as *const c_void)
        .finish()
}

// ---- model and motion I/O ----

#[derive(Default)]
pub struct TransformState {
    function: i32,
    language: i32,
    input: Vec<u8>,
    output: Vec<u8>,
}

unsafe extern "C" fn model_version(_: *const c_void) -> *const c_char {
    c"1.2.0".as_ptr()
}

unsafe extern "C" fn model_name(_: *const c_void) -> *const c_char {
    c"Fixture Model Tools".as_ptr()
}

unsafe extern "C" fn transform_count(_: *const c_void) -> c_int {
    2
}

unsafe extern "C" fn model_function_name(_: *const c_void, index: c_int) -> *const c_char {
    match index {
        0 => c"Mirror".as_ptr(),
        1 => c"Flip Normals".as_ptr(),
        _ => std::ptr::null(),
    }
}

unsafe extern "C" fn transform_set_function(instance: *mut c_void, index: c_int, status: *mut i32) {
    let state = unsafe { state::<TransformState>(instance) };
    if (0..2).contains(&index) {
        state.function = index;
    } else {
        unsafe { set_status(status, -2) };
    }
}

unsafe extern "C" fn transform_set_language(instance: *mut c_void, language: c_int, _: *mut i32) {
    bump("set_language");
    let state = unsafe { state::<TransformState>(instance) };
    state.language = language;
}

unsafe extern "C" fn transform_set_input(instance: *mut c_void, data: *const u8, len: u32, _: *mut i32) {
    bump("set_input");
    let state = unsafe { state::<TransformState>(instance) };
    state.input = unsafe { bytes(data, len) }.to_vec();
}

unsafe extern "C" fn transform_set_indices(_: *mut c_void, _: *const c_int, len: u32, _: *mut i32) {
    bump("set_indices");
    record_len(len);
    INDEX_LENS.with(|lens| lens.borrow_mut().push(len as usize));
}

unsafe extern "C" fn model_execute(instance: *mut c_void, status: *mut i32) {
    bump("execute");
    let state = unsafe { state::<TransformState>(instance) };
    if !state.input.starts_with(b"PMX ") {
        unsafe { set_status(status, -3) };
        return;
    }
    state.output = state.input.clone();
    state.output.extend_from_slice(b"|mirrored");
}

unsafe extern "C" fn transform_output_size(instance: *mut c_void, size: *mut u32) {
    let state = unsafe { state::<TransformState>(instance) };
    unsafe { *size = state.output.len() as u32 };
}

unsafe extern "C" fn transform_output_data(instance: *mut c_void, data: *mut u8, len: u32, status: *mut i32) {
    let state = unsafe { state::<TransformState>(instance) };
    unsafe { write_output(&state.output, data, len, status) };
}

pub fn model_bundle() -> StaticBundle {
    Symbols::base::<TransformState>(Category::ModelIo)
        .with("GetVersion", model_version as *const c_void)
        .with("CountAllFunctions", transform_count as *const c_void)
        .with("GetFunctionName", model_function_name as *const c_void)
        .with("SetFunction", transform_set_function as *const c_void)
        .with("SetInputModelData", transform_set_input as *const c_void)
        .with("Execute", model_execute as *const c_void)
        .with("GetOutputModelDataSize", transform_output_size as *const c_void)
        .with("GetOutputModelData", transform_output_data as *const c_void)
        .with("SetLanguage", transform_set_language as *const c_void)
        .with("GetName", model_name as *const c_void)
        .with("SetAllSelectedVertexObjectIndices", transform_set_indices as *const c_void)
        .finish()
}

/// Address of the fixture's shared index-list setter.
pub fn index_setter() -> *const c_void {
    transform_set_indices as *const c_void
}

/// Model fixture exporting every selection and editing-mask setter.
pub fn selecting_model_bundle() -> StaticBundle {
    let prefix = Category::ModelIo.symbol_prefix();
    let mut bundle = model_bundle();
    let selected = [
        "Vertex", "Material", "Bone", "Constraint", "Morph", "Label", "RigidBody", "Joint",
        "SoftBody",
    ];
    let masked = ["Vertex", "Material", "Bone", "RigidBody", "Joint", "SoftBody"];
    for kind in selected {
        bundle.insert(
            format!("{prefix}SetAllSelected{kind}ObjectIndices"),
            transform_set_indices as *const c_void,
        );
    }
    for kind in masked {
        bundle.insert(
            format!("{prefix}SetAllMasked{kind}ObjectIndices"),
            transform_set_indices as *const c_void,
        );
    }
    bundle
}

/// Model fixture that also exports `CreateWithLocation`.
pub fn located_model_bundle() -> StaticBundle {
    let mut bundle = model_bundle();
    bundle.insert(
        format!("{}CreateWithLocation", Category::ModelIo.symbol_prefix()),
        create_with_location::<TransformState> as *const c_void,
    );
    bundle
}

unsafe extern "C" fn motion_function_name(_: *const c_void, index: c_int) -> *const c_char {
    match index {
        0 => c"Smooth".as_ptr(),
        1 => c"Reverse".as_ptr(),
        _ => std::ptr::null(),
    }
}

unsafe extern "C" fn motion_execute(instance: *mut c_void, status: *mut i32) {
    bump("execute");
    let state = unsafe { state::<TransformState>(instance) };
    if !state.input.starts_with(b"Vocaloid Motion Data") {
        unsafe { set_status(status, -3) };
        return;
    }
    state.output = state.input.clone();
    state.output.extend_from_slice(b"|smoothed");
}

unsafe extern "C" fn motion_set_frames(_: *mut c_void, _: *const u32, len: u32, _: *mut i32) {
    bump("set_keyframes");
    record_len(len);
}

unsafe extern "C" fn motion_set_named_frames(
    _: *mut c_void,
    name: *const c_char,
    _: *const u32,
    len: u32,
    _: *mut i32,
) {
    bump("set_named_keyframes");
    record_text(unsafe { text(name) });
    record_len(len);
}

pub fn motion_bundle() -> StaticBundle {
    Symbols::base::<TransformState>(Category::MotionIo)
        .with("GetVersion", model_version as *const c_void)
        .with("CountAllFunctions", transform_count as *const c_void)
        .with("GetFunctionName", motion_function_name as *const c_void)
        .with("SetFunction", transform_set_function as *const c_void)
        .with("SetInputMotionData", transform_set_input as *const c_void)
        .with("Execute", motion_execute as *const c_void)
        .with("LoadUIWindowLayout", layout_load as *const c_void)
        .with("GetOutputMotionDataSize", transform_output_size as *const c_void)
        .with("GetOutputMotionData", transform_output_data as *const c_void)
        .with("SetLanguage", transform_set_language as *const c_void)
        .with("SetAllSelectedCameraKeyframes", motion_set_frames as *const c_void)
        .with("SetAllNamedSelectedBoneKeyframes", motion_set_named_frames as *const c_void)
        .finish()
}
