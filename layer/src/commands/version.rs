/// Get the version string for layer and liblayer
pub fn get_version_string() -> String {
    format!(
        "layer {}\nliblayer {}",
        env!("CARGO_PKG_VERSION"),
        liblayer::version()
    )
}

/// Print version information to stdout
pub fn print_version() {
    println!("{}", get_version_string());
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
