use std::{io::Cursor, path::PathBuf};

fn stopmo_exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_stopmo")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "stopmo.exe"
            } else {
                "stopmo"
            });
            p
        })
}

fn seed_images(dir: &std::path::Path, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for name in names {
        let img = image::RgbaImage::from_pixel(16, 16, image::Rgba([200, 100, 0, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        std::fs::write(dir.join(name), &buf).unwrap();
    }
}

#[test]
fn cli_list_prints_session_table() {
    let dir = PathBuf::from("target").join("cli_smoke_list");
    seed_images(&dir, &["a.png", "b.png"]);

    let out = std::process::Command::new(stopmo_exe())
        .args(["list", "--images"])
        .arg(&dir)
        .output()
        .unwrap();

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("a.png"));
    assert!(stdout.contains("b.png"));
    assert!(stdout.contains("total: 400 ms over 2 images"));
}

#[test]
fn cli_list_json_is_parseable_session_state() {
    let dir = PathBuf::from("target").join("cli_smoke_json");
    seed_images(&dir, &["a.png"]);

    let out = std::process::Command::new(stopmo_exe())
        .args(["list", "--json", "--images"])
        .arg(&dir)
        .output()
        .unwrap();

    assert!(out.status.success());
    let session: stopmo::Session = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(session.items.len(), 1);
    assert_eq!(session.total_duration_ms, 200);
    assert!(session.items[0].included);
}

#[test]
fn cli_thumbs_populates_cache() {
    let dir = PathBuf::from("target").join("cli_smoke_thumbs");
    seed_images(&dir.join("images"), &["a.png", "b.png"]);
    let cache = dir.join("thumbs");
    let _ = std::fs::remove_dir_all(&cache);

    let status = std::process::Command::new(stopmo_exe())
        .args(["thumbs", "--images"])
        .arg(dir.join("images"))
        .arg("--cache")
        .arg(&cache)
        .status()
        .unwrap();

    assert!(status.success());
    assert!(cache.join("a.png").exists());
    assert!(cache.join("b.png").exists());
}

#[test]
fn cli_render_writes_mp4_when_ffmpeg_is_present() {
    let ffmpeg_ok = std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    if !ffmpeg_ok {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }

    let dir = PathBuf::from("target").join("cli_smoke_render");
    seed_images(&dir.join("images"), &["a.png", "b.png", "c.png"]);
    let out_path = dir.join("out.mp4");
    let _ = std::fs::remove_file(&out_path);

    let status = std::process::Command::new(stopmo_exe())
        .args(["render", "--images"])
        .arg(dir.join("images"))
        .arg("--out")
        .arg(&out_path)
        .args(["--exclude", "1", "--total-ms", "400"])
        .status()
        .unwrap();

    assert!(status.success());
    assert!(out_path.exists());
}
