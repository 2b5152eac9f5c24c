pub mod at;
pub mod import;
pub mod info;
pub mod range;
pub mod view;

use crate::cli::ViewArgs;
use crate::error::{Error, Result};
use crate::storage::TraceReader;
use crate::trace::{INVALID_ADDRESS, TraceIndex};
use crate::viewport::ViewController;
use std::path::Path;

/// Open a trace and build its index
pub fn load_index(file: &Path) -> Result<(TraceReader, TraceIndex)> {
    let reader = TraceReader::open(file)?;
    let mut index = TraceIndex::new();
    reader.load_into(&mut index)?;
    Ok((reader, index))
}

/// Overview of the trace, then the origin and zoom overrides from the arguments
pub fn view_from_args<'a>(index: &'a TraceIndex, args: &ViewArgs) -> Result<ViewController<'a>> {
    let mut view = ViewController::new(index, args.width, args.height);
    view.zoom_to_overview();

    if let Some(address) = args.address {
        if index.real_to_display(address) == INVALID_ADDRESS {
            return Err(Error::InvalidArgument(format!(
                "address 0x{:x} is not inside any traced region",
                address
            )));
        }
        view.set_address(address);
    }
    if let Some(time) = args.time {
        view.set_time(time);
    }

    let mut viewport = *view.viewport();
    if let Some(zoom) = args.address_zoom {
        viewport.address_zoom_factor = zoom;
    }
    if let Some(zoom) = args.time_zoom {
        viewport.time_zoom_factor = zoom;
    }
    viewport.size_px = args.size_px;

    Ok(ViewController::with_viewport(
        index,
        viewport,
        args.width,
        args.height,
    ))
}
