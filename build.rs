fn main() {
    println!("cargo:rerun-if-env-changed=WIFI_SSID");
    println!("cargo:rerun-if-env-changed=WIFI_AUTH_TYPE");
    println!("cargo:rerun-if-env-changed=WIFI_PASSWORD");
    println!("cargo:rerun-if-env-changed=MEMFAULT_PROJECT_KEY");
    println!("cargo:rerun-if-env-changed=MEMFAULT_POST_SEND_INTERVAL_MS");

    if std::env::var("MEMFAULT_PROJECT_KEY").map_or(true, |k| k.is_empty()) {
        println!("cargo:warning=MEMFAULT_PROJECT_KEY is not set; chunk uploads will be rejected");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
