use anyhow::Error as Anyhow;
use clap::Subcommand;
use derive_more::From;

mod label;
mod split;
mod work;

#[derive(Debug, From, Subcommand)]
pub enum Applet {
    Label(label::Label),
    #[clap(hide = true)]
    Work(work::Work),
    Split(split::Split),
}

impl Applet {
    pub async fn execute(self) -> Result<(), Anyhow> {
        match self {
            Applet::Label(a) => Ok(a.execute().await?),
            Applet::Work(a) => Ok(a.execute().await?),
            Applet::Split(a) => Ok(a.execute().await?),
        }
    }
}
