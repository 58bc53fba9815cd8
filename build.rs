use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    // 编译时间戳（秒），用于 VERSION_FULL
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", timestamp);
}
