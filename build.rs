fn main() {
    // ESP-IDF link arguments are only needed for the device build; host
    // test builds run without the espidf feature and skip embuild.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
