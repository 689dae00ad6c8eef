//! Line format shared by the file and console sinks:
//!
//! ```text
//! [ 2024-05-01 13:45:12,087 ] pipeline::ingest -DEBUG - loaded 42 rows
//! ```

use chrono::Local;
use std::fmt;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// `strftime` pattern for the timestamp at the start of each line.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Formats events as `[ <time> ] <target> -<LEVEL> - <message> [fields]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();
        write!(
            writer,
            "[ {} ] {} -{} - ",
            Local::now().format(TIME_FORMAT),
            meta.target(),
            meta.level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
