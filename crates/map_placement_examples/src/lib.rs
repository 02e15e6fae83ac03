#![forbid(unsafe_code)]

mod textures;

pub use textures::{radial_gradient, solid_texture, texture_from_values, value_noise};

/// Initialize tracing for example binaries, honoring `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
