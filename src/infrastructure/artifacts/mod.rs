mod xlsx_renderer;

pub use xlsx_renderer::XlsxRenderer;
