mod common;

use common::{open_sim, F7_BASE};
use iidc::csr::format7 as f7;
use iidc::{ColorCoding, Error, RoiValue, VideoMode};

const MODE: VideoMode = VideoMode::Format7_0;

#[test]
fn mode_inquiry() {
    let mut camera = open_sim();
    assert_eq!(camera.format7_max_image_size(MODE).unwrap(), (1024, 768));
    assert_eq!(camera.format7_unit_size(MODE).unwrap(), (8, 2));
    assert_eq!(camera.format7_unit_position(MODE).unwrap(), (2, 2));
    assert_eq!(
        camera.format7_color_codings(MODE).unwrap(),
        vec![ColorCoding::Mono8, ColorCoding::Mono16, ColorCoding::Raw8]
    );

    let modeset = camera.format7_modeset().unwrap();
    assert_eq!(modeset.len(), 1);
    assert_eq!(modeset[0].mode, MODE);
    assert_eq!(modeset[0].max_size, (1024, 768));
}

#[test]
fn absent_slots_are_invalid_modes() {
    let mut camera = open_sim();
    assert_eq!(
        camera.format7_image_size(VideoMode::Format7_1),
        Err(Error::InvalidMode)
    );
    assert_eq!(
        camera.format7_image_size(VideoMode::Mode640x480_MONO8),
        Err(Error::InvalidMode)
    );
}

#[test]
fn roi_with_recommended_packet_size() {
    let mut camera = open_sim();
    camera
        .set_format7_roi(
            MODE,
            Some(ColorCoding::Mono8),
            RoiValue::Recommended,
            RoiValue::Exact(0),
            RoiValue::Exact(0),
            RoiValue::Exact(640),
            RoiValue::Exact(480),
        )
        .unwrap();

    // set-then-get returns exactly what was set
    assert_eq!(camera.format7_image_size(MODE).unwrap(), (640, 480));
    assert_eq!(camera.format7_image_position(MODE).unwrap(), (0, 0));
    assert_eq!(camera.format7_color_coding(MODE).unwrap(), ColorCoding::Mono8);

    // derived values follow the new geometry
    assert_eq!(camera.format7_pixel_number(MODE).unwrap(), 307_200);
    assert_eq!(camera.format7_total_bytes(MODE).unwrap(), 307_200);

    let bpp = camera.format7_byte_per_packet(MODE).unwrap();
    let (min, max) = camera.format7_packet_para(MODE).unwrap();
    assert!(bpp >= min && bpp <= max);
    assert_eq!((min, max), (64, 4096));
}

#[test]
fn roi_alignment_invariants_hold() {
    let mut camera = open_sim();
    camera
        .set_format7_roi(
            MODE,
            None,
            RoiValue::MaxAvail,
            RoiValue::Exact(16),
            RoiValue::Exact(32),
            RoiValue::Exact(320),
            RoiValue::Exact(240),
        )
        .unwrap();

    let (unit_w, unit_h) = camera.format7_unit_size(MODE).unwrap();
    let (unit_x, unit_y) = camera.format7_unit_position(MODE).unwrap();
    let (max_w, max_h) = camera.format7_max_image_size(MODE).unwrap();
    let (width, height) = camera.format7_image_size(MODE).unwrap();
    let (left, top) = camera.format7_image_position(MODE).unwrap();

    assert_eq!(width % unit_w, 0);
    assert_eq!(height % unit_h, 0);
    assert_eq!(left % unit_x, 0);
    assert_eq!(top % unit_y, 0);
    assert!(left + width <= max_w);
    assert!(top + height <= max_h);
}

#[test]
fn roi_rejects_stage_by_stage() {
    let mut camera = open_sim();

    // stage 1: not a (present) scalable mode
    assert_eq!(
        camera.set_format7_roi(
            VideoMode::Mode640x480_MONO8,
            None,
            RoiValue::FromCamera,
            RoiValue::FromCamera,
            RoiValue::FromCamera,
            RoiValue::FromCamera,
            RoiValue::FromCamera,
        ),
        Err(Error::InvalidMode)
    );

    // stage 2: coding outside the camera-reported set
    assert_eq!(
        camera.set_format7_roi(
            MODE,
            Some(ColorCoding::Yuv422),
            RoiValue::FromCamera,
            RoiValue::FromCamera,
            RoiValue::FromCamera,
            RoiValue::FromCamera,
            RoiValue::FromCamera,
        ),
        Err(Error::InvalidColorCoding)
    );

    // stage 3: width off the alignment unit
    assert_eq!(
        camera.set_format7_roi(
            MODE,
            None,
            RoiValue::FromCamera,
            RoiValue::Exact(0),
            RoiValue::Exact(0),
            RoiValue::Exact(641),
            RoiValue::Exact(480),
        ),
        Err(Error::Format7ErrorFlag1)
    );

    // stage 3: position + size past the sensor edge
    assert_eq!(
        camera.set_format7_roi(
            MODE,
            None,
            RoiValue::FromCamera,
            RoiValue::Exact(512),
            RoiValue::Exact(0),
            RoiValue::Exact(640),
            RoiValue::Exact(480),
        ),
        Err(Error::Format7ErrorFlag1)
    );

    // a rejected call leaves the camera untouched
    assert_eq!(camera.format7_image_size(MODE).unwrap(), (1024, 768));
    assert_eq!(camera.format7_image_position(MODE).unwrap(), (0, 0));

    // stage 4: packet size outside the re-queried bounds
    assert_eq!(
        camera.set_format7_roi(
            MODE,
            None,
            RoiValue::Exact(8192),
            RoiValue::Exact(0),
            RoiValue::Exact(0),
            RoiValue::Exact(640),
            RoiValue::Exact(480),
        ),
        Err(Error::Format7ErrorFlag2)
    );
}

#[test]
fn byte_accounting_follows_coding_changes() {
    let mut camera = open_sim();
    camera.set_format7_image_size(MODE, 640, 480).unwrap();
    assert_eq!(camera.format7_total_bytes(MODE).unwrap(), 307_200);

    camera
        .set_format7_color_coding(MODE, ColorCoding::Mono16)
        .unwrap();
    let pixels = u64::from(camera.format7_pixel_number(MODE).unwrap());
    let total = camera.format7_total_bytes(MODE).unwrap();
    assert_eq!(pixels, 307_200);
    assert_eq!(total, ColorCoding::Mono16.bytes_for_pixels(pixels));

    assert_eq!(
        camera.set_format7_color_coding(MODE, ColorCoding::Rgb8),
        Err(Error::InvalidColorCoding)
    );
}

#[test]
fn individual_geometry_setters_validate() {
    let mut camera = open_sim();

    assert_eq!(
        camera.set_format7_image_size(MODE, 0, 480),
        Err(Error::Format7ErrorFlag1)
    );
    assert_eq!(
        camera.set_format7_image_size(MODE, 644, 480),
        Err(Error::Format7ErrorFlag1)
    );
    assert_eq!(
        camera.set_format7_image_size(MODE, 640, 481),
        Err(Error::Format7ErrorFlag1)
    );

    camera.set_format7_image_size(MODE, 640, 480).unwrap();
    camera.set_format7_image_position(MODE, 128, 64).unwrap();
    assert_eq!(camera.format7_image_position(MODE).unwrap(), (128, 64));

    // position must keep the window inside the sensor
    assert_eq!(
        camera.set_format7_image_position(MODE, 512, 0),
        Err(Error::Format7ErrorFlag1)
    );
    // and on the position grid
    assert_eq!(
        camera.set_format7_image_position(MODE, 3, 0),
        Err(Error::Format7ErrorFlag1)
    );
}

#[test]
fn packet_size_bounds() {
    let mut camera = open_sim();
    camera.set_format7_byte_per_packet(MODE, 1024).unwrap();
    assert_eq!(camera.format7_byte_per_packet(MODE).unwrap(), 1024);

    assert_eq!(
        camera.set_format7_byte_per_packet(MODE, 32),
        Err(Error::ValueOutsideRange)
    );
    assert_eq!(
        camera.set_format7_byte_per_packet(MODE, 8192),
        Err(Error::ValueOutsideRange)
    );
    // off the packet granularity
    assert_eq!(
        camera.set_format7_byte_per_packet(MODE, 100),
        Err(Error::ValueOutsideRange)
    );
    assert_eq!(camera.format7_byte_per_packet(MODE).unwrap(), 1024);

    assert_eq!(camera.format7_recommended_byte_per_packet(MODE).unwrap(), 2048);
}

#[test]
fn packets_per_frame_derives_when_unreported() {
    let mut camera = open_sim();
    camera.set_format7_image_size(MODE, 640, 480).unwrap();
    camera.set_format7_byte_per_packet(MODE, 1024).unwrap();
    // 307200 / 1024 = 300 packets
    assert_eq!(camera.format7_packet_per_frame(MODE).unwrap(), 300);

    camera.set_format7_byte_per_packet(MODE, 4096).unwrap();
    // 307200 / 4096 = 75
    assert_eq!(camera.format7_packet_per_frame(MODE).unwrap(), 75);
}

#[test]
fn max_avail_size_fills_the_sensor() {
    let mut camera = open_sim();
    camera
        .set_format7_roi(
            MODE,
            None,
            RoiValue::MaxAvail,
            RoiValue::Exact(0),
            RoiValue::Exact(0),
            RoiValue::MaxAvail,
            RoiValue::MaxAvail,
        )
        .unwrap();
    assert_eq!(camera.format7_image_size(MODE).unwrap(), (1024, 768));
    assert_eq!(camera.format7_byte_per_packet(MODE).unwrap(), 4096);
}

#[test]
fn commit_is_skipped_without_a_settings_latch() {
    let mut camera = open_sim();
    // cameras predating the value-setting latch leave the register blank
    camera.device_mut().set_reg(F7_BASE + f7::VALUE_SETTING, 0);
    camera.set_format7_image_size(MODE, 640, 480).unwrap();
    assert_eq!(camera.format7_image_size(MODE).unwrap(), (640, 480));
}
