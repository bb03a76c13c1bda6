fn main() {
    // Host builds (tests, fuzzing) skip the ESP-IDF environment export.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
