//! Format layer creation macros

/// Applies the shared [`DisplayConfig`](crate::Config) switches to a fmt layer
/// and boxes it, dropping the timer when timestamps are disabled.
macro_rules! boxed_fmt_layer {
    ($layer:expr, $display:expr) => {{
        let layer = $layer
            .with_writer(std::io::stderr)
            .with_ansi($display.colors)
            .with_target($display.target)
            .with_file($display.source)
            .with_line_number($display.source)
            .with_thread_ids($display.thread_ids);

        if $display.time {
            layer.boxed()
        } else {
            layer.without_time().boxed()
        }
    }};
}

/// JSON has additional span options on top of the shared ones.
macro_rules! boxed_json_layer {
    ($display:expr) => {{
        boxed_fmt_layer!(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list($display.span_list)
                .flatten_event($display.flatten),
            $display
        )
    }};
}
