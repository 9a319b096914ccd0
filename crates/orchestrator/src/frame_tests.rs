// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn solid(width: u32, height: u32, color: (u8, u8, u8, u8)) -> Frame {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for _ in 0..(width * height) {
        rgba.extend_from_slice(&[color.0, color.1, color.2, color.3]);
    }
    Frame::new(width, height, rgba)
}

#[test]
fn pixel_at_out_of_bounds_is_none() {
    let frame = solid(2, 2, (1, 2, 3, 255));
    assert!(frame.pixel_at(2, 0).is_none());
    assert!(frame.pixel_at(0, 2).is_none());
    assert_eq!(frame.pixel_at(1, 1), Some((1, 2, 3, 255)));
}

#[test]
fn crop_clamps_to_bounds() {
    let frame = solid(10, 10, (9, 9, 9, 255));
    let cropped = frame.crop(8, 8, 50, 50).expect("in bounds");
    assert_eq!((cropped.width, cropped.height), (2, 2));
}

#[test]
fn crop_zero_area_is_none() {
    let frame = solid(4, 4, (0, 0, 0, 255));
    assert!(frame.crop(0, 0, 0, 4).is_none());
    assert!(frame.crop(4, 4, 1, 1).is_none());
}
