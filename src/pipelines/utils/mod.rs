use super::cache::ModelOptions;
use crate::error::{PipelineError, Result};
use candle_core::Device;

/// Device requested by a pipeline builder.
#[derive(Debug, Clone, Default)]
pub enum DeviceRequest {
    #[default]
    Cpu,
    Cuda(usize),
}

impl DeviceRequest {
    pub fn resolve(&self) -> Result<Device> {
        match *self {
            DeviceRequest::Cpu => Ok(Device::Cpu),
            DeviceRequest::Cuda(i) => Device::new_cuda(i).map_err(|e| {
                PipelineError::Device(format!(
                    "Failed to init CUDA device {i}: {e}. Try CPU as fallback."
                ))
            }),
        }
    }
}

pub fn build_cache_key<O: ModelOptions>(options: &O, device: &Device) -> String {
    format!("{}-{:?}", options.cache_key(), device.location())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Opts;

    impl ModelOptions for Opts {
        fn cache_key(&self) -> String {
            "bilstm".into()
        }
    }

    #[test]
    fn cpu_request_resolves() {
        let device = DeviceRequest::default().resolve().unwrap();
        assert!(device.is_cpu());
    }

    #[test]
    fn cache_key_includes_device() {
        let key = build_cache_key(&Opts, &Device::Cpu);
        assert!(key.starts_with("bilstm-"));
        assert!(key.contains("Cpu"));
    }
}
