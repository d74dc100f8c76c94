//! Build script for mojostep-core
//!
//! Checks the minimum Rust version before compilation (Edition 2021 =
//! Rust 1.56.0+). The crate itself is host-agnostic; there are no
//! platform-specific requirements to verify here.

fn main()
{
    // Check minimum Rust version
    // Edition 2021 requires Rust 1.56.0
    if let Ok(rustc_version) = rustc_version::version() {
        let min_rust_version = rustc_version::Version::parse("1.56.0").unwrap();

        if rustc_version < min_rust_version {
            panic!(
                "mojostep-core requires Rust {} or newer (Edition 2021), found {}",
                min_rust_version, rustc_version
            );
        }
    } else {
        // If we can't get version (e.g., in some build environments), just warn
        println!("cargo:warning=could not verify Rust version");
    }
}
