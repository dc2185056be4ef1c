//! The `desktop_context` entity describing the host machine.

use crate::SelfDescribingJson;
use crate::constants::{
    DESKTOP_DEVICE_MANUFACTURER, DESKTOP_DEVICE_MODEL, DESKTOP_DEVICE_PROCESSOR_COUNT,
    DESKTOP_OS_IS_64_BIT, DESKTOP_OS_SERVICE_PACK, DESKTOP_OS_TYPE, DESKTOP_OS_VERSION,
    SCHEMA_DESKTOP_CONTEXT,
};
use serde_json::{Map, Value, json};
use std::sync::OnceLock;

static DESKTOP_CONTEXT: OnceLock<SelfDescribingJson> = OnceLock::new();

/// Desktop context for this process, computed on first use.
pub fn desktop_context() -> SelfDescribingJson {
    DESKTOP_CONTEXT.get_or_init(build).clone()
}

fn build() -> SelfDescribingJson {
    let mut data = Map::new();
    data.insert(DESKTOP_OS_TYPE.into(), json!(os_type()));
    data.insert(DESKTOP_OS_VERSION.into(), json!(os_version()));
    data.insert(DESKTOP_OS_SERVICE_PACK.into(), json!(""));
    data.insert(DESKTOP_OS_IS_64_BIT.into(), json!(cfg!(target_pointer_width = "64")));
    data.insert(DESKTOP_DEVICE_MANUFACTURER.into(), json!(read_dmi("sys_vendor")));
    data.insert(DESKTOP_DEVICE_MODEL.into(), json!(read_dmi("product_name")));
    data.insert(DESKTOP_DEVICE_PROCESSOR_COUNT.into(), json!(processor_count()));
    SelfDescribingJson::new(SCHEMA_DESKTOP_CONTEXT, Value::Object(data))
}

fn os_type() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "macOS",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

fn os_version() -> String {
    std::fs::read_to_string("/proc/sys/kernel/osrelease")
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn read_dmi(name: &str) -> String {
    std::fs::read_to_string(format!("/sys/class/dmi/id/{name}"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn processor_count() -> usize {
    std::thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
}
