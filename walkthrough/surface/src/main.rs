//! 读取标签体数据, 测量细胞表面积, 并导出网格.
//!
//! 参数通过环境变量给出: `$CELL_LABELS`, `$CELL_SPACING`, `$CELL_LABEL`, `$CELL_OUTPUT_DIR`,
//! 以及可选的 `$CELL_INTENSITY`.

mod result;
mod runner;

fn main() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
        .unwrap();

    runner::run().analyze();
}
