use candle_core::Device;
use tracing::{debug, info, warn};

/// Opens one accelerator.
type DeviceProbe = fn() -> candle_core::Result<Device>;

/// Accelerators compiled into this build, in preference order.
#[allow(unused_mut)]
fn accelerators() -> Vec<(&'static str, DeviceProbe)> {
    let mut probes: Vec<(&'static str, DeviceProbe)> = Vec::new();
    #[cfg(feature = "metal")]
    probes.push(("metal", || Device::new_metal(0)));
    #[cfg(feature = "cuda")]
    probes.push(("cuda", || Device::new_cuda(0)));
    probes
}

/// First accelerator that opens, else the CPU.
pub fn select_device() -> Device {
    let mut failures = Vec::new();

    for (name, probe) in accelerators() {
        match probe() {
            Ok(device) => {
                info!(device = name, "Cross-encoder running on accelerator");
                return device;
            }
            Err(e) => {
                warn!(device = name, error = %e, "Accelerator unavailable");
                failures.push(format!("{name}: {e}"));
            }
        }
    }

    if failures.is_empty() {
        debug!("No accelerator compiled in; cross-encoder running on CPU");
    } else {
        warn!(failures = %failures.join("; "), "Cross-encoder falling back to CPU");
    }
    Device::Cpu
}

/// Short device name for logs.
pub fn device_label(device: &Device) -> &'static str {
    if device.is_cuda() {
        "cuda"
    } else if device.is_metal() {
        "metal"
    } else {
        "cpu"
    }
}
