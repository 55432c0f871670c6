fn main() {
    // Host-side test builds run with `--no-default-features` and have no
    // ESP-IDF toolchain to probe.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
