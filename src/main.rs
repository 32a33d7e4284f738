mod args;
mod entry;
mod logger;

use loadflow::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
