mod app;
mod ui;

use crate::error::Result;
use crate::storage::TraceReader;
use crate::trace::TraceIndex;

pub use app::App;

/// Run the interactive viewer over a loaded trace
pub fn run(reader: TraceReader, index: &TraceIndex) -> Result<()> {
    let mut app = App::new(reader, index);
    app.run()
}
