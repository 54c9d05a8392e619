use super::*;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("target")
        .join("unit_sink")
        .join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn writes_png_and_leaves_no_temporary() {
    let dir = scratch_dir("writes_png");
    let path = dir.join("nested").join("card.png");

    let img = RgbaImage::from_pixel(7, 5, image::Rgba([1, 2, 3, 128]));
    write_png(&img, &path).unwrap();

    let back = image::open(&path).unwrap().to_rgba8();
    assert_eq!(back, img);

    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(leftovers, vec![std::ffi::OsString::from("card.png")]);
}

#[test]
fn overwrites_existing_output() {
    let dir = scratch_dir("overwrites");
    let path = dir.join("card.png");

    write_png(&RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255])), &path).unwrap();
    let second = RgbaImage::from_pixel(3, 3, image::Rgba([255, 255, 255, 255]));
    write_png(&second, &path).unwrap();

    assert_eq!(image::open(&path).unwrap().to_rgba8(), second);
}

#[test]
fn failed_move_keeps_previous_state_and_cleans_up() {
    let dir = scratch_dir("failed_move");
    // A directory where the file should go makes the rename fail.
    let path = dir.join("card.png");
    std::fs::create_dir_all(path.join("blocker")).unwrap();

    let err = write_png(&RgbaImage::new(2, 2), &path).unwrap_err();
    assert!(matches!(err, LastListenedError::Render(_)));
    assert!(path.is_dir());

    let names: Vec<_> = std::fs::read_dir(&dir)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("card.png")]);
}

#[test]
fn path_without_file_name_is_rejected() {
    let err = write_png(&RgbaImage::new(1, 1), Path::new("/")).unwrap_err();
    assert!(matches!(err, LastListenedError::Render(_)));
}
