fn main() {
    // Only the firmware binary needs the ESP-IDF environment; host builds
    // (tests, fuzzing) skip it entirely.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
