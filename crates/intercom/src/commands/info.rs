//! Device identity.

use std::fmt::Write;

use intercom_core::{DeviceInfo, UpdateCoordinator};

use crate::output::{self, OutputOpts};

fn detail(info: &DeviceInfo, host: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:          {}", info.name);
    let _ = writeln!(out, "Device ID:     {}", info.identifier);
    let _ = writeln!(out, "Manufacturer:  {}", info.manufacturer);
    let _ = writeln!(out, "Model:         {}", info.model.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "Firmware:      {}", info.sw_version.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "MAC:           {}", info.connection.1);
    let _ = write!(out, "Host:          {host}");
    out
}

pub fn handle(coordinator: &UpdateCoordinator, opts: &OutputOpts) {
    let info = DeviceInfo::from(coordinator.identity());
    let host = coordinator.client().host().to_owned();

    let rendered = output::render_single(
        opts.format,
        &info,
        |i| detail(i, &host),
        |i| i.identifier.clone(),
    );
    opts.print(&rendered);
}
