use super::{load_index, view_from_args};
use crate::cli::ViewArgs;
use crate::error::Result;
use crate::viewport::{ScreenPoint, ScreenRect};
use std::path::Path;

pub fn run(file: &Path, start: (i32, i32), end: (i32, i32), args: &ViewArgs) -> Result<()> {
    let (_reader, index) = load_index(file)?;
    let view = view_from_args(&index, args)?;

    let rect = ScreenRect::new(
        ScreenPoint::new(start.0, start.1),
        ScreenPoint::new(end.0, end.1),
    );
    let report = index.range_query(view.viewport(), rect);
    println!("{}", report);

    Ok(())
}
