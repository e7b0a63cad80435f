// SPDX-License-Identifier: GPL-3.0-only

//! WGSL validation for the preview program

use edge_preview::shaders::SHADER_SOURCE;
use edge_preview::shaders::texture_renderer::{
    SAMPLER_BINDING, TEXTURE_BINDING, TEXTURE_GROUP, UNIFORM_GROUP, UNIFORM_MVP_BINDING,
};

/// Parse and validate a WGSL shader using naga
fn parse_and_validate(name: &str, source: &str) -> naga::Module {
    let module = match naga::front::wgsl::parse_str(source) {
        Ok(module) => module,
        Err(e) => panic!("Shader '{}' parse failed: {:?}", name, e),
    };

    if let Err(e) = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    {
        panic!("Shader '{}' validation failed: {:?}", name, e);
    }

    module
}

fn binding_of(module: &naga::Module, var: &str) -> Option<(u32, u32)> {
    module
        .global_variables
        .iter()
        .find(|(_, gv)| gv.name.as_deref() == Some(var))
        .and_then(|(_, gv)| gv.binding.as_ref())
        .map(|b| (b.group, b.binding))
}

#[test]
fn test_preview_shader_validates() {
    parse_and_validate("texture_quad", SHADER_SOURCE);
}

#[test]
fn test_preview_shader_entry_points() {
    let module = parse_and_validate("texture_quad", SHADER_SOURCE);
    let stages: Vec<(&str, naga::ShaderStage)> = module
        .entry_points
        .iter()
        .map(|ep| (ep.name.as_str(), ep.stage))
        .collect();
    assert!(stages.contains(&("vs_main", naga::ShaderStage::Vertex)));
    assert!(stages.contains(&("fs_main", naga::ShaderStage::Fragment)));
}

#[test]
fn test_preview_shader_bindings_match_renderer() {
    let module = parse_and_validate("texture_quad", SHADER_SOURCE);
    assert_eq!(
        binding_of(&module, "uniforms"),
        Some((UNIFORM_GROUP, UNIFORM_MVP_BINDING))
    );
    assert_eq!(
        binding_of(&module, "frame_texture"),
        Some((TEXTURE_GROUP, TEXTURE_BINDING))
    );
    assert_eq!(
        binding_of(&module, "frame_sampler"),
        Some((TEXTURE_GROUP, SAMPLER_BINDING))
    );
}

#[test]
fn test_broken_shader_fails_to_parse() {
    assert!(naga::front::wgsl::parse_str("@vertex fn vs_main( -> {").is_err());
}
