use super::{load_index, view_from_args};
use crate::cli::ViewArgs;
use crate::error::Result;
use crate::viewport::ScreenPoint;
use std::path::Path;

pub fn run(file: &Path, x: i32, y: i32, args: &ViewArgs) -> Result<()> {
    let (reader, index) = load_index(file)?;
    let view = view_from_args(&index, args)?;
    let pos = ScreenPoint::new(x, y);

    println!("{}", view.cursor_position(pos));
    let event = index.point_query(view.viewport(), pos);
    println!("{}", reader.describe_event(&event)?);

    Ok(())
}
