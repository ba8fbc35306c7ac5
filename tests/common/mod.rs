//! Shared fixtures for the integration tests.
//!
//! The logging consumers record every callback as a string, so a traversal
//! can be checked against an expected trace line by line.

#![allow(dead_code)]

use std::sync::Arc;

use deferred_engine::instance::{
    ArrayObjectId, Instance, InstanceBatched, InstanceBatchedDynamic, InstanceBillboarded,
    InstanceBillboardedDynamic, InstanceSingle, InstanceSingleStatic,
};
use deferred_engine::light::Light;
use deferred_engine::material::{Material, MaterialInstance, Shader, ShaderProgram};
use deferred_engine::transform::Transform;
use deferred_engine::visibility::{LightsConsumer, VisibilityConsumer};
use deferred_engine::{Group, Id};

pub type TestMaterial = Arc<MaterialInstance<()>>;
pub type TestShader = Arc<ShaderProgram>;

/// Route `log` records to the test harness output. Safe to call from every test.
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();
}

pub fn shader(id: u64) -> TestShader {
    Arc::new(ShaderProgram::with_id(Id::from_raw(id), "test"))
}

pub fn material(id: u64, shader: &TestShader) -> TestMaterial {
    Arc::new(MaterialInstance::with_id(Id::from_raw(id), shader.clone(), ()))
}

pub fn single(id: u64, array: u32) -> Arc<InstanceSingleStatic> {
    Arc::new(InstanceSingleStatic::with_id(
        Id::from_raw(id),
        ArrayObjectId(array),
        Transform::default(),
    ))
}

pub fn batched(id: u64, array: u32) -> Arc<InstanceBatchedDynamic> {
    Arc::new(InstanceBatchedDynamic::with_id(Id::from_raw(id), ArrayObjectId(array), 4))
}

pub fn billboarded(id: u64, array: u32) -> Arc<InstanceBillboardedDynamic> {
    Arc::new(InstanceBillboardedDynamic::with_id(Id::from_raw(id), ArrayObjectId(array), 4))
}

/// Error raised by a consumer told to abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abort(pub String);

/// Records every callback. If `abort_on` is set, the first callback whose
/// record starts with it is recorded and then fails.
#[derive(Debug, Default)]
pub struct LoggingConsumer {
    pub trace: Vec<String>,
    pub abort_on: Option<String>,
}

impl LoggingConsumer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aborting_on(prefix: &str) -> Self {
        Self {
            trace: Vec::new(),
            abort_on: Some(prefix.to_string()),
        }
    }

    fn log(&mut self, record: String) -> Result<(), Abort> {
        let abort = matches!(&self.abort_on, Some(prefix) if record.starts_with(prefix.as_str()));
        self.trace.push(record.clone());
        if abort {
            Err(Abort(record))
        } else {
            Ok(())
        }
    }
}

fn sm(material: &TestMaterial) -> String {
    format!("{} {}", material.shader().shader_id(), material.material_id())
}

impl VisibilityConsumer<TestMaterial> for LoggingConsumer {
    type Error = Abort;

    fn on_start(&mut self) -> Result<(), Abort> {
        self.log("on_start".into())
    }

    fn on_instance_batched_update(&mut self, i: &dyn InstanceBatched) -> Result<(), Abort> {
        self.log(format!("on_instance_batched_update {}", i.instance_id()))
    }

    fn on_instance_billboarded_update(&mut self, i: &dyn InstanceBillboarded) -> Result<(), Abort> {
        self.log(format!("on_instance_billboarded_update {}", i.instance_id()))
    }

    fn on_start_group(&mut self, group: Group) -> Result<(), Abort> {
        self.log(format!("on_start_group {}", group))
    }

    fn on_instance_batched_shader_start(&mut self, s: &ShaderProgram) -> Result<(), Abort> {
        self.log(format!("on_instance_batched_shader_start {}", s.shader_id()))
    }

    fn on_instance_batched_material_start(&mut self, m: &TestMaterial) -> Result<(), Abort> {
        self.log(format!("on_instance_batched_material_start {}", sm(m)))
    }

    fn on_instance_batched(&mut self, _m: &TestMaterial, i: &dyn InstanceBatched) -> Result<(), Abort> {
        self.log(format!("on_instance_batched {}", i.instance_id()))
    }

    fn on_instance_batched_material_finish(&mut self, m: &TestMaterial) -> Result<(), Abort> {
        self.log(format!("on_instance_batched_material_finish {}", sm(m)))
    }

    fn on_instance_batched_shader_finish(&mut self, s: &ShaderProgram) -> Result<(), Abort> {
        self.log(format!("on_instance_batched_shader_finish {}", s.shader_id()))
    }

    fn on_instance_billboarded_shader_start(&mut self, s: &ShaderProgram) -> Result<(), Abort> {
        self.log(format!("on_instance_billboarded_shader_start {}", s.shader_id()))
    }

    fn on_instance_billboarded_material_start(&mut self, m: &TestMaterial) -> Result<(), Abort> {
        self.log(format!("on_instance_billboarded_material_start {}", sm(m)))
    }

    fn on_instance_billboarded(&mut self, _m: &TestMaterial, i: &dyn InstanceBillboarded) -> Result<(), Abort> {
        self.log(format!("on_instance_billboarded {}", i.instance_id()))
    }

    fn on_instance_billboarded_material_finish(&mut self, m: &TestMaterial) -> Result<(), Abort> {
        self.log(format!("on_instance_billboarded_material_finish {}", sm(m)))
    }

    fn on_instance_billboarded_shader_finish(&mut self, s: &ShaderProgram) -> Result<(), Abort> {
        self.log(format!("on_instance_billboarded_shader_finish {}", s.shader_id()))
    }

    fn on_instance_single_shader_start(&mut self, s: &ShaderProgram) -> Result<(), Abort> {
        self.log(format!("on_instance_single_shader_start {}", s.shader_id()))
    }

    fn on_instance_single_material_start(&mut self, m: &TestMaterial) -> Result<(), Abort> {
        self.log(format!("on_instance_single_material_start {}", sm(m)))
    }

    fn on_instance_single_array_start(&mut self, i: &dyn InstanceSingle) -> Result<(), Abort> {
        self.log(format!("on_instance_single_array_start {}", i.array_object()))
    }

    fn on_instance_single(&mut self, _m: &TestMaterial, i: &dyn InstanceSingle) -> Result<(), Abort> {
        self.log(format!("on_instance_single {}", i.instance_id()))
    }

    fn on_instance_single_material_finish(&mut self, m: &TestMaterial) -> Result<(), Abort> {
        self.log(format!("on_instance_single_material_finish {}", sm(m)))
    }

    fn on_instance_single_shader_finish(&mut self, s: &ShaderProgram) -> Result<(), Abort> {
        self.log(format!("on_instance_single_shader_finish {}", s.shader_id()))
    }

    fn on_finish_group(&mut self, group: Group) -> Result<(), Abort> {
        self.log(format!("on_finish_group {}", group))
    }

    fn on_finish(&mut self) -> Result<(), Abort> {
        self.log("on_finish".into())
    }
}

impl LightsConsumer<TestShader> for LoggingConsumer {
    type Error = Abort;

    fn on_start(&mut self) -> Result<(), Abort> {
        self.log("on_start".into())
    }

    fn on_start_group(&mut self, group: Group) -> Result<(), Abort> {
        self.log(format!("on_start_group {}", group))
    }

    fn on_light_shader_start(&mut self, s: &TestShader) -> Result<(), Abort> {
        self.log(format!("on_light_shader_start {}", s.shader_id()))
    }

    fn on_light_array_start(&mut self, l: &dyn Light) -> Result<(), Abort> {
        self.log(format!("on_light_array_start {}", l.array_object()))
    }

    fn on_light(&mut self, _s: &TestShader, l: &dyn Light) -> Result<(), Abort> {
        self.log(format!("on_light {}", l.light_id()))
    }

    fn on_light_shader_finish(&mut self, s: &TestShader) -> Result<(), Abort> {
        self.log(format!("on_light_shader_finish {}", s.shader_id()))
    }

    fn on_finish_group(&mut self, group: Group) -> Result<(), Abort> {
        self.log(format!("on_finish_group {}", group))
    }

    fn on_finish(&mut self) -> Result<(), Abort> {
        self.log("on_finish".into())
    }
}
