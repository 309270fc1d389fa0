use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "wpt-latest",
    about = "Run a WebPageTest benchmark against a build and load the results into Redshift",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Page to benchmark, e.g. http://10.0.0.5:3030/
    /// (must use an IP address so that traffic is routed locally)
    #[arg(value_name = "TEST_URL")]
    pub test_url: String,
}
