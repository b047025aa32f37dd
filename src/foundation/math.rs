/// `x * y / 255`, rounded to nearest, for 8-bit channel math.
pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
