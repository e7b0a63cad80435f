// SPDX-License-Identifier: GPL-3.0-only

//! GPU initialization
//!
//! Creates the wgpu device and queue shared by the texture renderer and the
//! offscreen render target. No window or surface is needed.

use crate::errors::RenderError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info};

pub use wgpu;

/// Information about the created GPU device
#[derive(Debug, Clone)]
pub struct GpuDeviceInfo {
    /// Name of the GPU adapter
    pub adapter_name: String,
    /// Backend being used (Vulkan, Metal, DX12, etc.)
    pub backend: wgpu::Backend,
    /// Integrated, discrete, software...
    pub device_type: wgpu::DeviceType,
    /// Driver name and version as reported by the adapter
    pub driver: String,
}

impl std::fmt::Display for GpuDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({:?}, {:?})",
            self.adapter_name, self.backend, self.device_type
        )?;
        if !self.driver.is_empty() {
            write!(f, " driver {}", self.driver)?;
        }
        Ok(())
    }
}

/// Device, queue and adapter description
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub info: GpuDeviceInfo,
    lost: Arc<AtomicBool>,
}

impl GpuContext {
    /// Whether the driver reported the device as lost
    ///
    /// Every handle created from this context is unusable afterwards; a new
    /// context and renderer have to be created.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }
}

/// Create a wgpu device and queue for rendering.
pub async fn create_device(label: &str) -> Result<GpuContext, RenderError> {
    info!(label = label, "Creating GPU device");

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::from_env().unwrap_or_default(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| RenderError::NoAdapter(e.to_string()))?;

    let adapter_info = adapter.get_info();

    info!(
        adapter = %adapter_info.name,
        backend = ?adapter_info.backend,
        "GPU adapter selected"
    );

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits()),
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        })
        .await
        .map_err(|e| RenderError::DeviceCreation(e.to_string()))?;

    let lost = Arc::new(AtomicBool::new(false));
    let lost_flag = Arc::clone(&lost);
    device.set_device_lost_callback(move |reason, message| {
        if reason == wgpu::DeviceLostReason::Destroyed {
            debug!(message = %message, "GPU device destroyed");
            return;
        }
        error!(?reason, message = %message, "GPU device lost");
        lost_flag.store(true, Ordering::Release);
    });

    let info = GpuDeviceInfo {
        adapter_name: adapter_info.name.clone(),
        backend: adapter_info.backend,
        device_type: adapter_info.device_type,
        driver: format!("{} {}", adapter_info.driver, adapter_info.driver_info)
            .trim()
            .to_string(),
    };
    debug!(info = %info, "GPU device ready");

    Ok(GpuContext {
        device: Arc::new(device),
        queue: Arc::new(queue),
        info,
        lost,
    })
}

/// Blocking wrapper around [`create_device`] for synchronous callers
pub fn create_device_blocking(label: &str) -> Result<GpuContext, RenderError> {
    pollster::block_on(create_device(label))
}
