//! Purpose: Motion I/O proxy for plugins that transform serialized motion data.
//! Exports: `MotionIo`, `MotionIoSymbols`, `KeyframeKind`, `NamedKeyframeKind`.
//! Role: Same configure/execute/fetch protocol as model I/O, keyed by keyframe selections.
//! Invariants: Keyframe selections are forwarded even when empty.
use crate::config::Language;
use crate::core::abi::Category;
use crate::core::error::Error;
use crate::core::lifecycle::PluginHost;

use super::exchange::{self, Execution, ExecutionState};
use super::impl_proxy;
use super::layout::LayoutSlots;
use super::sys::{
    CountFunctionsFn, DataSizeFn, DescribeFn, FunctionNameFn, ReadDataFn, SetBytesFn,
    SetComponentLayoutFn, SetFramesFn, SetFunctionFn, SetLanguageFn, SetNamedFramesFn, StatusFn,
};

crate::plugin_symbols! {
    pub struct MotionIoSymbols for Category::MotionIo;
    required {
        version: DescribeFn = "GetVersion",
        count_functions: CountFunctionsFn = "CountAllFunctions",
        function_name: FunctionNameFn = "GetFunctionName",
        set_function: SetFunctionFn = "SetFunction",
        set_input_motion_data: SetBytesFn = "SetInputMotionData",
        execute: StatusFn = "Execute",
        load_ui_window_layout: StatusFn = "LoadUIWindowLayout",
        output_size: DataSizeFn = "GetOutputMotionDataSize",
        output_data: ReadDataFn = "GetOutputMotionData",
    }
    optional {
        set_language: SetLanguageFn = "SetLanguage",
        name: DescribeFn = "GetName",
        description: DescribeFn = "GetDescription",
        named_bone_keyframes: SetNamedFramesFn = "SetAllNamedSelectedBoneKeyframes",
        named_morph_keyframes: SetNamedFramesFn = "SetAllNamedSelectedMorphKeyframes",
        accessory_keyframes: SetFramesFn = "SetAllSelectedAccessoryKeyframes",
        camera_keyframes: SetFramesFn = "SetAllSelectedCameraKeyframes",
        light_keyframes: SetFramesFn = "SetAllSelectedLightKeyframes",
        model_keyframes: SetFramesFn = "SetAllSelectedModelKeyframes",
        self_shadow_keyframes: SetFramesFn = "SetAllSelectedSelfShadowKeyframes",
        set_input_active_model_data: SetBytesFn = "SetInputActiveModelData",
        set_input_audio_data: SetBytesFn = "SetInputAudioData",
        set_audio_description: SetBytesFn = "SetAudioDescription",
        set_camera_description: SetBytesFn = "SetCameraDescription",
        set_light_description: SetBytesFn = "SetLightDescription",
        ui_window_layout_size: DataSizeFn = "GetUIWindowLayoutDataSize",
        ui_window_layout_data: ReadDataFn = "GetUIWindowLayoutData",
        set_ui_component_layout: SetComponentLayoutFn = "SetUIComponentLayoutData",
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum KeyframeKind {
    Accessory,
    Camera,
    Light,
    Model,
    SelfShadow,
}

impl KeyframeKind {
    pub const ALL: [KeyframeKind; 5] = [
        KeyframeKind::Accessory,
        KeyframeKind::Camera,
        KeyframeKind::Light,
        KeyframeKind::Model,
        KeyframeKind::SelfShadow,
    ];
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum NamedKeyframeKind {
    Bone,
    Morph,
}

impl MotionIoSymbols {
    fn keyframes(&self, kind: KeyframeKind) -> Option<SetFramesFn> {
        match kind {
            KeyframeKind::Accessory => self.accessory_keyframes,
            KeyframeKind::Camera => self.camera_keyframes,
            KeyframeKind::Light => self.light_keyframes,
            KeyframeKind::Model => self.model_keyframes,
            KeyframeKind::SelfShadow => self.self_shadow_keyframes,
        }
    }

    fn named_keyframes(&self, kind: NamedKeyframeKind) -> Option<SetNamedFramesFn> {
        match kind {
            NamedKeyframeKind::Bone => self.named_bone_keyframes,
            NamedKeyframeKind::Morph => self.named_morph_keyframes,
        }
    }

    fn layout(&self) -> LayoutSlots {
        LayoutSlots {
            load: Some(self.load_ui_window_layout),
            size: self.ui_window_layout_size,
            data: self.ui_window_layout_data,
            set_component: self.set_ui_component_layout,
        }
    }
}

pub struct MotionIo {
    host: PluginHost<MotionIoSymbols>,
    execution: Execution,
}

impl_proxy!(MotionIo, MotionIoSymbols, execution: Execution::default());

impl MotionIo {
    pub fn name(&mut self) -> Result<String, Error> {
        let (symbols, instance) = self.host.active()?;
        Ok(exchange::describe(symbols.name, instance)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.host.file_name().to_string()))
    }

    pub fn description(&mut self) -> Result<Option<String>, Error> {
        let (symbols, instance) = self.host.active()?;
        Ok(exchange::describe(symbols.description, instance))
    }

    pub fn plugin_version(&mut self) -> Result<Option<String>, Error> {
        let (symbols, instance) = self.host.active()?;
        Ok(exchange::describe(Some(symbols.version), instance))
    }

    pub fn functions(&mut self) -> Result<Vec<String>, Error> {
        let (symbols, instance) = self.host.active()?;
        let count = exchange::function_count(symbols.count_functions, instance);
        Ok((0..count)
            .map(|index| {
                exchange::function_name(symbols.function_name, instance, index).unwrap_or_default()
            })
            .collect())
    }

    pub fn function_count(&mut self) -> Result<usize, Error> {
        let (symbols, instance) = self.host.active()?;
        Ok(exchange::function_count(symbols.count_functions, instance))
    }

    pub fn set_language(&mut self, language: Language) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        let Some(set_language) = symbols.set_language else {
            return Ok(());
        };
        let mut status = 0;
        unsafe { set_language(instance, language.code(), &mut status) };
        self.host.check(status)
    }

    pub fn set_function(&mut self, index: usize) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        let index = exchange::function_index(index)?;
        self.execution.reconfigure();
        let mut status = 0;
        unsafe { (symbols.set_function)(instance, index, &mut status) };
        self.host.check(status)
    }

    pub fn set_selected_keyframes(
        &mut self,
        kind: KeyframeKind,
        frames: &[u32],
    ) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution.reconfigure();
        exchange::send_frames(&self.host, symbols.keyframes(kind), instance, frames)
    }

    /// Selection for one named bone or morph track.
    pub fn set_named_selected_keyframes(
        &mut self,
        kind: NamedKeyframeKind,
        name: &str,
        frames: &[u32],
    ) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution.reconfigure();
        exchange::send_named_frames(&self.host, symbols.named_keyframes(kind), instance, name, frames)
    }

    pub fn set_input_data(&mut self, data: &[u8]) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution.reconfigure();
        exchange::send_bytes(&self.host, Some(symbols.set_input_motion_data), instance, data)
    }

    pub fn set_input_active_model(&mut self, data: &[u8]) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution.reconfigure();
        exchange::send_bytes(&self.host, symbols.set_input_active_model_data, instance, data)
    }

    pub fn set_input_audio(&mut self, description: &[u8], data: &[u8]) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution.reconfigure();
        exchange::send_bytes(&self.host, symbols.set_audio_description, instance, description)?;
        exchange::send_bytes(&self.host, symbols.set_input_audio_data, instance, data)
    }

    pub fn set_camera_description(&mut self, data: &[u8]) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution.reconfigure();
        exchange::send_bytes(&self.host, symbols.set_camera_description, instance, data)
    }

    pub fn set_light_description(&mut self, data: &[u8]) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution.reconfigure();
        exchange::send_bytes(&self.host, symbols.set_light_description, instance, data)
    }

    pub fn execute(&mut self) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution.run(&self.host, symbols.execute, instance)
    }

    pub fn execution_state(&self) -> ExecutionState {
        self.execution.state()
    }

    pub fn output_data(&mut self) -> Result<Vec<u8>, Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution
            .output(&self.host, symbols.output_size, symbols.output_data, instance)
    }

    pub fn has_ui_window_layout(&self) -> bool {
        self.host
            .symbols()
            .is_some_and(|symbols| symbols.layout().is_supported())
    }

    pub fn ui_window_layout(&mut self) -> Result<Vec<u8>, Error> {
        let (symbols, instance) = self.host.active()?;
        symbols.layout().window_layout(&self.host, instance)
    }

    pub fn set_ui_component_layout(&mut self, id: &str, data: &[u8]) -> Result<bool, Error> {
        let (symbols, instance) = self.host.active()?;
        symbols
            .layout()
            .set_component_layout(&self.host, instance, id, data)
    }
}
