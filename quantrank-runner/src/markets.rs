//! Market universes: exchange metadata and default ticker lists.
//!
//! Tickers carry the Yahoo Finance exchange suffix (`.L` for London,
//! `.KL` for Kuala Lumpur).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    /// London Stock Exchange, top 50 by market cap.
    Uk,
    /// Bursa Malaysia, FTSE Bursa Malaysia Top 100 members.
    My,
}

impl Market {
    pub const ALL: [Market; 2] = [Market::Uk, Market::My];

    pub fn code(&self) -> &'static str {
        match self {
            Market::Uk => "UK",
            Market::My => "MY",
        }
    }

    pub fn exchange(&self) -> &'static str {
        match self {
            Market::Uk => "London Stock Exchange",
            Market::My => "Bursa Malaysia",
        }
    }

    pub fn index_name(&self) -> &'static str {
        match self {
            Market::Uk => "FTSE 100",
            Market::My => "FTSE Bursa Malaysia Top 100",
        }
    }

    pub fn currency(&self) -> &'static str {
        match self {
            Market::Uk => "GBP",
            Market::My => "MYR",
        }
    }

    pub fn currency_symbol(&self) -> &'static str {
        match self {
            Market::Uk => "£",
            Market::My => "RM",
        }
    }

    pub fn ticker_suffix(&self) -> &'static str {
        match self {
            Market::Uk => ".L",
            Market::My => ".KL",
        }
    }

    pub fn tickers(&self) -> Vec<String> {
        let list = match self {
            Market::Uk => UK_TICKERS,
            Market::My => MY_TICKERS,
        };
        list.iter().map(|t| t.to_string()).collect()
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UK" | "LSE" => Ok(Market::Uk),
            "MY" | "KLSE" | "BURSA" => Ok(Market::My),
            other => Err(format!("unknown market '{other}' (expected UK or MY)")),
        }
    }
}

const UK_TICKERS: &[&str] = &[
    "AZN.L", "SHEL.L", "HSBA.L", "ULVR.L", "BATS.L", "RR.L",
    "REL.L", "GSK.L", "LSEG.L", "BA.L", "RIO.L", "NG.L",
    "BARC.L", "LLOY.L", "DGE.L", "GLEN.L", "PRU.L", "AAL.L",
    "STAN.L", "VOD.L", "BP.L", "BHP.L", "AV.L", "LGEN.L",
    "IMB.L", "BT-A.L", "SSE.L", "EXPN.L", "ANTO.L", "SMIN.L",
    "SPX.L", "HLMA.L", "ADM.L", "ABF.L", "PSON.L", "RKT.L",
    "IAG.L", "WPP.L", "CRDA.L", "FERG.L", "BRBY.L", "AUTO.L",
    "ENT.L", "MNG.L", "JD.L", "SBRY.L", "TSCO.L", "MKS.L",
    "EZJ.L", "SMT.L",
];

const MY_TICKERS: &[&str] = &[
    "MAYBANK.KL", "PUBLICBANK.KL", "CIMB.KL", "RHB.KL", "HLBANK.KL", "PCHEM.KL",
    "IOICORP.KL", "SIME.KL", "GENTING.KL", "GENM.KL", "AMMB.KL", "UEMS.KL",
    "TENAGA.KL", "MAXIS.KL", "DIGI.KL", "AXIATA.KL", "TM.KL", "PPB.KL",
    "FGV.KL", "KLK.KL", "IOIPG.KL", "UMW.KL", "MISC.KL", "DIALOG.KL",
    "PETDAG.KL", "PETGAS.KL", "SAPNRG.KL", "AIRPORT.KL", "IHH.KL", "KPJ.KL",
    "TOPGLOV.KL", "HARTALEGA.KL", "SUPERMX.KL", "SCIENTX.KL", "NESTLE.KL", "F&N.KL",
    "DLADY.KL", "YTL.KL", "YTLPOWR.KL", "GAMUDA.KL", "IJM.KL", "WPRTS.KL",
    "MMCCORP.KL", "MALAYSIAN.KL", "SUNWAY.KL", "SPSETIA.KL", "MAHSING.KL", "ECOWLD.KL",
    "HAPSENG.KL", "LPI.KL", "ALLIANZ.KL", "STMB.KL", "VS.KL", "INARI.KL",
    "FRONTKN.KL", "GLOBETEC.KL", "UNISEM.KL", "KESM.KL", "MALAKOFF.KL", "YINSON.KL",
    "VELESTO.KL", "SKPETRO.KL", "SHANG.KL", "LION.KL", "MEDIA.KL", "ASTRO.KL",
    "PADINI.KL", "BAT.KL", "HEIM.KL", "CARLSBG.KL", "PBBANK.KL", "RHBBANK.KL",
    "HLFG.KL", "HLIND.KL", "HARTA.KL", "MFCB.KL", "KLCC.KL", "ALAQAR.KL",
    "PAVREIT.KL", "SUNREIT.KL", "YTREIT.KL", "STARREIT.KL", "AXREIT.KL",
];
