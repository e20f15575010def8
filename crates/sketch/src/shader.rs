//! GLSL sources for the trail program and a CPU mirror of its shading math.
//!
//! The trail is drawn by a single full-screen quad. Every fragment measures
//! its distance to the segment between the previous and current cursor
//! positions and turns that distance into a coloured core plus a faint white
//! highlight. Overlapping draws compound through `ONE, ONE_MINUS_SRC_ALPHA`
//! blending, which is configured by `gpu::resources`.
//!
//! The drawing buffer the trail accumulates in is shown on screen by a second,
//! internal blit program (`BLIT_*`).

/// Full-screen quad as two triangles, two floats per vertex.
pub const QUAD_VERTICES: [f32; 12] = [1.0, 1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, 1.0, -1.0, 1.0, 1.0];

/// Index list for [`QUAD_VERTICES`].
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 3, 4, 5];

/// Name of the vertex position attribute.
pub const POSITION_ATTRIBUTE: &str = "a_position";

pub const RESOLUTION_UNIFORM: &str = "u_resolution";
pub const CURSOR_UNIFORM: &str = "u_cursorNDC";
pub const OLD_CURSOR_UNIFORM: &str = "u_oldCursorNDC";
pub const TIME_UNIFORM: &str = "u_time";
pub const COLOR_UNIFORM: &str = "u_color";

/// Distance at which the coloured core is fully bright.
pub const CORE_INNER: f32 = 0.04;
/// Distance at which the coloured core has faded out.
pub const CORE_OUTER: f32 = 0.05;
/// Distance at which the highlight is fully bright.
pub const HIGHLIGHT_INNER: f32 = 0.01;
/// Highlight intensity multiplier.
pub const HIGHLIGHT_SCALE: f32 = 0.2;

/// Passes the quad position straight through to clip space.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;

void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Glow around the segment `u_oldCursorNDC -> u_cursorNDC`.
///
/// The uniform block layout is reflected at start-up, so member order here is
/// free to change as long as the names stay the same.
pub const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform TrailParams {
    vec2 u_resolution;
    vec2 u_cursorNDC;
    vec2 u_oldCursorNDC;
    float u_time;
    vec3 u_color;
} params;

// Minimum distance between point p and the segment vw.
float distancePointToSegment(vec2 v, vec2 w, vec2 p) {
    vec2 segment = w - v;
    float l2 = dot(segment, segment);
    if (l2 == 0.0) {
        return distance(p, v);
    }
    float t = clamp(dot(p - v, segment) / l2, 0.0, 1.0);
    return distance(p, v + t * segment);
}

void main() {
    // Framebuffer rows grow downwards; the trail math expects a bottom-left origin.
    vec2 fragCoord = vec2(gl_FragCoord.x, params.u_resolution.y - gl_FragCoord.y);
    float aspect = params.u_resolution.x / params.u_resolution.y;

    vec2 uv = fragCoord / params.u_resolution * 2.0 - 1.0;
    uv = vec2(uv.x * aspect, uv.y);
    vec2 m = vec2(params.u_cursorNDC.x * aspect, params.u_cursorNDC.y);
    vec2 om = vec2(params.u_oldCursorNDC.x * aspect, params.u_oldCursorNDC.y);

    float dist = distancePointToSegment(om, m, uv);
    float brightness = 1.0 - smoothstep(0.04, 0.05, dist);
    vec3 color = mix(vec3(0.0), params.u_color, brightness);
    color *= brightness;
    color += vec3(1.0) * (1.0 - smoothstep(0.01, 0.04, dist)) * 0.2;

    outColor = vec4(color, brightness);
}
";

/// Full-screen triangle used to present the drawing buffer.
pub(crate) const BLIT_VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec2 v_uv;

const vec2 positions[3] = vec2[3](
    vec2(-1.0, -3.0),
    vec2(3.0, 1.0),
    vec2(-1.0, 1.0)
);

void main() {
    uint vertex_index = uint(gl_VertexIndex);
    vec2 pos = positions[vertex_index];
    v_uv = vec2(pos.x * 0.5 + 0.5, 0.5 - pos.y * 0.5);
    gl_Position = vec4(pos, 0.0, 1.0);
}
";

/// Samples the drawing buffer; `{OPAQUE}` is replaced with `true` or `false`.
const BLIT_FRAGMENT_TEMPLATE: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(set = 0, binding = 0) uniform texture2D canvas_texture;
layout(set = 0, binding = 1) uniform sampler canvas_sampler;

const bool OPAQUE_CANVAS = {OPAQUE};

void main() {
    vec4 texel = texture(sampler2D(canvas_texture, canvas_sampler), v_uv);
    if (OPAQUE_CANVAS) {
        outColor = vec4(texel.rgb, 1.0);
    } else {
        outColor = texel;
    }
}
";

/// Builds the blit fragment shader for an opaque or alpha-composited surface.
pub(crate) fn blit_fragment_shader(opaque: bool) -> String {
    BLIT_FRAGMENT_TEMPLATE.replace("{OPAQUE}", if opaque { "true" } else { "false" })
}

/// Hermite interpolation matching GLSL `smoothstep` for `edge0 < edge1`.
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Minimum distance between `p` and the segment `v -> w`.
///
/// The projection parameter is clamped to `[0, 1]`, so points beyond either
/// end measure to the nearer endpoint. A zero-length segment degenerates to
/// the point distance.
pub fn distance_point_to_segment(v: [f32; 2], w: [f32; 2], p: [f32; 2]) -> f32 {
    let segment = [w[0] - v[0], w[1] - v[1]];
    let l2 = segment[0] * segment[0] + segment[1] * segment[1];
    if l2 == 0.0 {
        return distance(p, v);
    }
    let t = (((p[0] - v[0]) * segment[0] + (p[1] - v[1]) * segment[1]) / l2).clamp(0.0, 1.0);
    let projection = [v[0] + t * segment[0], v[1] + t * segment[1]];
    distance(p, projection)
}

fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

/// Uniform values seen by one fragment invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadeInputs {
    pub resolution: [f32; 2],
    pub cursor: [f32; 2],
    pub old_cursor: [f32; 2],
    pub color: [f32; 3],
}

/// CPU evaluation of [`FRAGMENT_SHADER_GLSL`] for a fragment at `frag_coord`
/// (pixels, bottom-left origin). Returns premultiplied RGBA.
pub fn shade(frag_coord: [f32; 2], inputs: &ShadeInputs) -> [f32; 4] {
    let [width, height] = inputs.resolution;
    let aspect = width / height;
    let uv = [
        (frag_coord[0] / width * 2.0 - 1.0) * aspect,
        frag_coord[1] / height * 2.0 - 1.0,
    ];
    let m = [inputs.cursor[0] * aspect, inputs.cursor[1]];
    let om = [inputs.old_cursor[0] * aspect, inputs.old_cursor[1]];

    let dist = distance_point_to_segment(om, m, uv);
    let brightness = 1.0 - smoothstep(CORE_INNER, CORE_OUTER, dist);
    let highlight = (1.0 - smoothstep(HIGHLIGHT_INNER, CORE_INNER, dist)) * HIGHLIGHT_SCALE;

    let mut rgba = [0.0; 4];
    for (channel, value) in inputs.color.iter().enumerate() {
        rgba[channel] = value * brightness * brightness + highlight;
    }
    rgba[3] = brightness;
    rgba
}
