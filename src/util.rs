use std::fmt::Write as _;

use glam::{Mat3, Mat4};

use crate::pipeline::FrameUniforms;

/// Pretty-prints a matrix row by row, the way it reads on paper
/// (glam stores columns).
pub fn format_mat4(name: &str, mat: &Mat4) -> String {
    let mut output = format!("{name}:\n");
    for i in 0..4 {
        let row = mat.row(i);
        let _ = writeln!(
            output,
            "  [{:9.4} {:9.4} {:9.4} {:9.4}]",
            row.x, row.y, row.z, row.w
        );
    }
    output
}

pub fn format_mat3(name: &str, mat: &Mat3) -> String {
    let mut output = format!("{name}:\n");
    for i in 0..3 {
        let row = mat.row(i);
        let _ = writeln!(output, "  [{:9.4} {:9.4} {:9.4}]", row.x, row.y, row.z);
    }
    output
}

/// Everything the `M` key logs for one frame.
pub fn format_frame(frame: &FrameUniforms) -> String {
    let mut output = String::new();
    output.push_str(&format_mat4("model", &frame.model));
    output.push_str(&format_mat4("view", &frame.view));
    output.push_str(&format_mat4("projection", &frame.projection));
    output.push_str(&format_mat4("mvp", &frame.mvp));
    output.push_str(&format_mat3("normal", &frame.normal_matrix));
    let l = frame.light_view;
    let _ = writeln!(output, "light (view space): [{:.4} {:.4} {:.4}]", l.x, l.y, l.z);
    output
}
