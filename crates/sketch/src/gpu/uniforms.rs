use crate::compile::UniformLocations;
use crate::session::FrameInputs;

/// CPU copy of the trail uniform block, laid out by reflected offsets.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TrailUniforms {
    locations: UniformLocations,
    bytes: Vec<u8>,
}

impl TrailUniforms {
    pub(crate) fn new(locations: UniformLocations) -> Self {
        Self {
            locations,
            bytes: vec![0; buffer_size(&locations) as usize],
        }
    }

    /// Writes every uniform for `frame` at its resolved offset.
    pub(crate) fn update(&mut self, frame: &FrameInputs) {
        let locations = self.locations;
        self.write(locations.resolution, &frame.dimensions.as_f32());
        self.write(locations.cursor_ndc, &frame.cursor_ndc.to_array());
        self.write(locations.old_cursor_ndc, &frame.old_cursor_ndc.to_array());
        self.write(locations.time, &[frame.time]);
        self.write(locations.color, &frame.color.to_array());
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn write(&mut self, offset: u32, values: &[f32]) {
        let data: &[u8] = bytemuck::cast_slice(values);
        let start = offset as usize;
        self.bytes[start..start + data.len()].copy_from_slice(data);
    }
}

/// Uniform buffer size: the block span rounded up to std140's 16-byte alignment.
pub(crate) fn buffer_size(locations: &UniformLocations) -> u64 {
    (u64::from(locations.block_size.max(1)) + 15) & !15
}
