// =============================================================================
// Default ticker universe: NSE large and mid caps grouped by sector
// =============================================================================
//
// Used when neither the config file nor BANDWATCH_SYMBOLS provides symbols.
// Yahoo Finance notation: `<TICKER>.NS`.

pub const DEFAULT_UNIVERSE: &[&str] = &[
    "DEEPAKFERT.NS", "MRPL.NS", "APOLLOTYRE.NS", "ASHOKLEY.NS", "BAJAJ-AUTO.NS",
    "BALKRISIND.NS", "BOSCHLTD.NS", "BHARATFORG.NS", "EICHERMOT.NS", "HEROMOTOCO.NS", "M&M.NS",
    "MARUTI.NS", "MOTHERSON.NS", "MRF.NS", "TATAMOTORS.NS", "TATAMTRDVR.NS", "TVSMOTOR.NS",
    "AUBANK.NS", "AXISBANK.NS", "BANDHANBNK.NS", "BANKBARODA.NS", "CANBK.NS", "CENTRALBK.NS",
    "CUB.NS", "FEDERALBNK.NS", "HDFCBANK.NS", "ICICIBANK.NS", "IDFCFIRSTB.NS", "INDUSINDBK.NS",
    "KOTAKBANK.NS", "PNB.NS", "RBLBANK.NS", "SBIN.NS", "YESBANK.NS", "ABB.NS", "ASTRAL.NS",
    "BEL.NS", "BHEL.NS", "CROMPTON.NS", "CUMMINSIND.NS", "DIXON.NS", "HAL.NS", "HAVELLS.NS",
    "LT.NS", "POLYCAB.NS", "SIEMENS.NS", "VOLTAS.NS", "ACC.NS", "AMBUJACEM.NS", "DALBHARAT.NS",
    "GRASIM.NS", "INDIACEM.NS", "JKCEMENT.NS", "RAMCOCEM.NS", "SHREECEM.NS", "STARCEMENT.NS",
    "ULTRACEMCO.NS", "AARTIIND.NS", "ATUL.NS", "CHAMBLFERT.NS", "COROMANDEL.NS", "DEEPAKNTR.NS",
    "GNFC.NS", "NAVINFLUOR.NS", "PIDLITIND.NS", "PIIND.NS", "TATACHEM.NS", "UPL.NS",
    "ABCAPITAL.NS", "BAJAJFINSV.NS", "BAJFINANCE.NS", "CANFINHOME.NS", "CHOLAFIN.NS",
    "HDFCAMC.NS", "HDFCLIFE.NS", "ICICIGI.NS", "ICICIPRULI.NS", "IDFC.NS", "L&TFH.NS",
    "LICHSGFIN.NS", "LICI.NS", "M&MFIN.NS", "MANAPPURAM.NS", "MFSL.NS", "MUTHOOTFIN.NS",
    "PEL.NS", "PFC.NS", "RECLTD.NS", "SBICARD.NS", "SBILIFE.NS", "SRIRAMFIN.NS",
    "ASIANPAINT.NS", "AWL.NS", "BALRAMCHIN.NS", "BATAINDIA.NS", "BERGEPAINT.NS", "BRITANNIA.NS",
    "COLPAL.NS", "DABUR.NS", "GODFRYPHLP.NS", "GODREJCP.NS", "HINDUNILVR.NS", "INDIAMART.NS",
    "ITC.NS", "MARICO.NS", "NESTLEIND.NS", "SIRCA.NS", "TATACONSUM.NS", "TITAN.NS", "UBL.NS",
    "ZYDUSWELL.NS", "ADANIENT.NS", "ADANIPORTS.NS", "CONCOR.NS", "GMRINFRA.NS", "INDIGO.NS",
    "IRCTC.NS", "APOLLO.NS", "BSOFT.NS", "COFORGE.NS", "FSL.NS", "HCLTECH.NS", "HGS.NS",
    "INFY.NS", "INTELLECT.NS", "KPITTECH.NS", "LTIM.NS", "LTTS.NS", "MCX.NS", "MPHASIS.NS",
    "NAUKRI.NS", "OFSS.NS", "PERSISTENT.NS", "TATAELXSI.NS", "TCS.NS", "TECHM.NS", "WIPRO.NS",
    "ZENTEC.NS", "PVRINOX.NS", "SUNTV.NS", "ZEEL.NS", "APLAPOLLO.NS", "COALINDIA.NS",
    "HINDALCO.NS", "HINDCOPPER.NS", "HINDZINC.NS", "JINDALSTEL.NS", "JSWSTEEL.NS",
    "NATIONALUM.NS", "NMDC.NS", "SAIL.NS", "TATASTEEL.NS", "VEDL.NS", "BPCL.NS", "GAIL.NS",
    "GUJGASLTD.NS", "HINDPETRO.NS", "IGL.NS", "IOC.NS", "MGL.NS", "ONGC.NS", "PETRONET.NS",
    "RELIANCE.NS", "BAJAJHIND.NS", "DEVYANI.NS", "GRSE.NS", "IRFC.NS", "NYKAA.NS",
    "POLYPLEX.NS", "RAJPACK.NS", "RENUKA.NS", "RVNL.NS", "TTKPRESTIG.NS", "ZOMATO.NS",
    "ABBOTINDIA.NS", "ALKEM.NS", "APOLLOHOSP.NS", "AUROPHARMA.NS", "BIOCON.NS", "CIPLA.NS",
    "DIVISLAB.NS", "DRREDDY.NS", "GLENMARK.NS", "GRANULES.NS", "IPCALAB.NS", "LALPATHLAB.NS",
    "LAURUSLABS.NS", "LUPIN.NS", "METROPOLIS.NS", "SUNPHARMA.NS", "SYNGENE.NS", "TORNTPHARM.NS",
    "ZYDUSLIFE.NS", "IEX.NS", "NTPC.NS", "POWERGRID.NS", "SUZLON.NS", "TATAPOWER.NS",
    "DELTACORP.NS", "DLF.NS", "GODREJPROP.NS", "INDHOTEL.NS", "OBEROIRLTY.NS", "BHARTIARTL.NS",
    "IDEA.NS", "INDUSTOWER.NS", "TATACOMM.NS", "TELECOM.NS", "ABFRL.NS", "PAGEIND.NS",
    "RAYMOND.NS", "SRF.NS", "TRENT.NS",
];
