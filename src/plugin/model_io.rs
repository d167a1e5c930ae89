//! Purpose: Model I/O proxy for plugins that transform a serialized model.
//! Exports: `ModelIo`, `ModelIoSymbols`, `ModelObjectKind`.
//! Role: Multi-phase configuration followed by one execute and a two-call output fetch.
//! Invariants: Selection and mask lists are always forwarded, including empty ones.
//! Invariants: Entry points newer than the plugin's ABI are skipped and report success.
use crate::config::Language;
use crate::core::abi::Category;
use crate::core::error::Error;
use crate::core::lifecycle::PluginHost;

use super::exchange::{self, Execution, ExecutionState};
use super::impl_proxy;
use super::layout::LayoutSlots;
use super::sys::{
    CountFunctionsFn, DataSizeFn, DescribeFn, FunctionNameFn, ReadDataFn, SetBytesFn,
    SetComponentLayoutFn, SetFlagFn, SetFunctionFn, SetIndicesFn, SetLanguageFn, StatusFn,
};

crate::plugin_symbols! {
    pub struct ModelIoSymbols for Category::ModelIo;
    required {
        version: DescribeFn = "GetVersion",
        count_functions: CountFunctionsFn = "CountAllFunctions",
        function_name: FunctionNameFn = "GetFunctionName",
        set_function: SetFunctionFn = "SetFunction",
        set_input_model_data: SetBytesFn = "SetInputModelData",
        execute: StatusFn = "Execute",
        output_size: DataSizeFn = "GetOutputModelDataSize",
        output_data: ReadDataFn = "GetOutputModelData",
    }
    optional {
        set_language: SetLanguageFn = "SetLanguage",
        name: DescribeFn = "GetName",
        description: DescribeFn = "GetDescription",
        set_input_audio_data: SetBytesFn = "SetInputAudioData",
        set_audio_description: SetBytesFn = "SetAudioDescription",
        set_camera_description: SetBytesFn = "SetCameraDescription",
        set_light_description: SetBytesFn = "SetLightDescription",
        selected_vertex: SetIndicesFn = "SetAllSelectedVertexObjectIndices",
        selected_material: SetIndicesFn = "SetAllSelectedMaterialObjectIndices",
        selected_bone: SetIndicesFn = "SetAllSelectedBoneObjectIndices",
        selected_constraint: SetIndicesFn = "SetAllSelectedConstraintObjectIndices",
        selected_morph: SetIndicesFn = "SetAllSelectedMorphObjectIndices",
        selected_label: SetIndicesFn = "SetAllSelectedLabelObjectIndices",
        selected_rigid_body: SetIndicesFn = "SetAllSelectedRigidBodyObjectIndices",
        selected_joint: SetIndicesFn = "SetAllSelectedJointObjectIndices",
        selected_soft_body: SetIndicesFn = "SetAllSelectedSoftBodyObjectIndices",
        masked_vertex: SetIndicesFn = "SetAllMaskedVertexObjectIndices",
        masked_material: SetIndicesFn = "SetAllMaskedMaterialObjectIndices",
        masked_bone: SetIndicesFn = "SetAllMaskedBoneObjectIndices",
        masked_rigid_body: SetIndicesFn = "SetAllMaskedRigidBodyObjectIndices",
        masked_joint: SetIndicesFn = "SetAllMaskedJointObjectIndices",
        masked_soft_body: SetIndicesFn = "SetAllMaskedSoftBodyObjectIndices",
        set_editing_mode_enabled: SetFlagFn = "SetEditingModeEnabled",
        load_ui_window_layout: StatusFn = "LoadUIWindowLayout",
        ui_window_layout_size: DataSizeFn = "GetUIWindowLayoutDataSize",
        ui_window_layout_data: ReadDataFn = "GetUIWindowLayoutData",
        set_ui_component_layout: SetComponentLayoutFn = "SetUIComponentLayoutData",
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ModelObjectKind {
    Vertex,
    Material,
    Bone,
    Constraint,
    Morph,
    Label,
    RigidBody,
    Joint,
    SoftBody,
}

impl ModelObjectKind {
    pub const ALL: [ModelObjectKind; 9] = [
        ModelObjectKind::Vertex,
        ModelObjectKind::Material,
        ModelObjectKind::Bone,
        ModelObjectKind::Constraint,
        ModelObjectKind::Morph,
        ModelObjectKind::Label,
        ModelObjectKind::RigidBody,
        ModelObjectKind::Joint,
        ModelObjectKind::SoftBody,
    ];

    /// Kinds the editing mask covers.
    pub const MASKABLE: [ModelObjectKind; 6] = [
        ModelObjectKind::Vertex,
        ModelObjectKind::Material,
        ModelObjectKind::Bone,
        ModelObjectKind::RigidBody,
        ModelObjectKind::Joint,
        ModelObjectKind::SoftBody,
    ];
}

impl ModelIoSymbols {
    fn selected(&self, kind: ModelObjectKind) -> Option<SetIndicesFn> {
        match kind {
            ModelObjectKind::Vertex => self.selected_vertex,
            ModelObjectKind::Material => self.selected_material,
            ModelObjectKind::Bone => self.selected_bone,
            ModelObjectKind::Constraint => self.selected_constraint,
            ModelObjectKind::Morph => self.selected_morph,
            ModelObjectKind::Label => self.selected_label,
            ModelObjectKind::RigidBody => self.selected_rigid_body,
            ModelObjectKind::Joint => self.selected_joint,
            ModelObjectKind::SoftBody => self.selected_soft_body,
        }
    }

    fn masked(&self, kind: ModelObjectKind) -> Option<SetIndicesFn> {
        match kind {
            ModelObjectKind::Vertex => self.masked_vertex,
            ModelObjectKind::Material => self.masked_material,
            ModelObjectKind::Bone => self.masked_bone,
            ModelObjectKind::RigidBody => self.masked_rigid_body,
            ModelObjectKind::Joint => self.masked_joint,
            ModelObjectKind::SoftBody => self.masked_soft_body,
            ModelObjectKind::Constraint | ModelObjectKind::Morph | ModelObjectKind::Label => None,
        }
    }

    fn layout(&self) -> LayoutSlots {
        LayoutSlots {
            load: self.load_ui_window_layout,
            size: self.ui_window_layout_size,
            data: self.ui_window_layout_data,
            set_component: self.set_ui_component_layout,
        }
    }
}

pub struct ModelIo {
    host: PluginHost<ModelIoSymbols>,
    execution: Execution,
}

impl_proxy!(ModelIo, ModelIoSymbols, execution: Execution::default());

impl ModelIo {
    /// Plugin-supplied name, falling back to the library file name.
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

    pub fn function_count(&mut self) -> Result<usize, Error> {
        let (symbols, instance) = self.host.active()?;
        Ok(exchange::function_count(symbols.count_functions, instance))
    }

    pub fn function_name(&mut self, index: usize) -> Result<Option<String>, Error> {
        let (symbols, instance) = self.host.active()?;
        Ok(exchange::function_name(symbols.function_name, instance, index))
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

    pub fn set_selected_indices(
        &mut self,
        kind: ModelObjectKind,
        indices: &[i32],
    ) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution.reconfigure();
        exchange::send_indices(&self.host, symbols.selected(kind), instance, indices)
    }

    pub fn set_masked_indices(
        &mut self,
        kind: ModelObjectKind,
        indices: &[i32],
    ) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution.reconfigure();
        exchange::send_indices(&self.host, symbols.masked(kind), instance, indices)
    }

    pub fn set_editing_mode_enabled(&mut self, enabled: bool) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        if let Some(set_editing_mode) = symbols.set_editing_mode_enabled {
            unsafe { set_editing_mode(instance, i32::from(enabled)) };
        }
        Ok(())
    }

    pub fn set_input_data(&mut self, data: &[u8]) -> Result<(), Error> {
        let (symbols, instance) = self.host.active()?;
        self.execution.reconfigure();
        exchange::send_bytes(&self.host, Some(symbols.set_input_model_data), instance, data)
    }

    /// Sends the audio description first and the samples only if it was accepted.
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
