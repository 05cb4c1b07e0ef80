//! Interactive numbered menu.

use anyhow::Result;
use bot_config::TwapSettings;
use bot_core::Exchange;
use bot_execution::{OrderHandler, TwapRequest};
use tracing::info;

use super::{report, twap};
use crate::cli::console::Console;
use crate::cli::interrupt::Interrupt;
use crate::cli::output::{print_balance, print_order, print_orders, print_symbol};

const MENU: &str = "
==================================================
       BINANCE FUTURES TESTNET TRADING BOT
==================================================
 1. Place Market Order
 2. Place Limit Order
 3. Place Stop-Limit Order
 4. Execute TWAP Order
 5. Check Order Status
 6. Cancel Order
 7. View Open Orders
 8. View Account Balance
 9. Symbol Info & Price
10. Exit
==================================================";

pub async fn run(
    exchange: &dyn Exchange,
    console: &mut Console,
    twap_settings: &TwapSettings,
    interrupt: &Interrupt,
) -> Result<()> {
    let handler = OrderHandler::new(exchange);

    loop {
        println!("{}", MENU);
        let choice = console.ask("Select an option (1-10)").await?;
        println!();

        match choice.as_str() {
            "1" => {
                let symbol = console.ask("Symbol (e.g. BTCUSDT)").await?;
                let side = console.ask("Side (BUY/SELL)").await?;
                let quantity = console.ask("Quantity").await?;
                report(handler.place_market(&symbol, &side, &quantity).await, print_order);
            }
            "2" => {
                let symbol = console.ask("Symbol (e.g. BTCUSDT)").await?;
                let side = console.ask("Side (BUY/SELL)").await?;
                let quantity = console.ask("Quantity").await?;
                let price = console.ask("Limit price").await?;
                let tif = console.ask_or("Time in force (GTC/IOC/FOK/GTX)", "GTC").await?;
                report(
                    handler
                        .place_limit(&symbol, &side, &quantity, &price, Some(&tif))
                        .await,
                    print_order,
                );
            }
            "3" => {
                let symbol = console.ask("Symbol (e.g. BTCUSDT)").await?;
                let side = console.ask("Side (BUY/SELL)").await?;
                let quantity = console.ask("Quantity").await?;
                let stop = console.ask("Stop price (trigger)").await?;
                let price = console.ask("Limit price").await?;
                let tif = console.ask_or("Time in force (GTC/IOC/FOK/GTX)", "GTC").await?;
                report(
                    handler
                        .place_stop_limit(&symbol, &side, &quantity, &stop, &price, Some(&tif))
                        .await,
                    print_order,
                );
            }
            "4" => {
                let request = TwapRequest {
                    symbol: console.ask("Symbol (e.g. BTCUSDT)").await?,
                    side: console.ask("Side (BUY/SELL)").await?,
                    total_quantity: console.ask("Total quantity").await?,
                    slice_count: console.ask_parsed("Number of slices [5]", 5).await?,
                    duration_secs: console.ask_parsed("Duration in seconds [600]", 600).await?,
                    limit_price: console
                        .ask_optional("Limit price per slice (blank for market)")
                        .await?,
                    time_in_force: None,
                };
                let report = twap::execute(exchange, &request, twap_settings, false, interrupt).await;
                println!("{}", report.summary());
            }
            "5" => {
                let symbol = console.ask("Symbol").await?;
                let order_id = console.ask("Order ID").await?;
                report(handler.order_status(&symbol, &order_id).await, print_order);
            }
            "6" => {
                let symbol = console.ask("Symbol").await?;
                let order_id = console.ask("Order ID").await?;
                report(handler.cancel(&symbol, &order_id).await, |order| {
                    println!("Order {} canceled", order.order_id);
                    print_order(order);
                });
            }
            "7" => {
                let symbol = console.ask_optional("Symbol (blank for all)").await?;
                report(handler.open_orders(symbol.as_deref()).await, |orders| {
                    print_orders(orders)
                });
            }
            "8" => {
                report(handler.balance().await, print_balance);
            }
            "9" => {
                let symbol = console.ask("Symbol").await?;
                report(handler.symbol_info(&symbol).await, print_symbol);
            }
            "10" => {
                info!("Exiting trading bot");
                println!("Goodbye!");
                return Ok(());
            }
            other => println!("Invalid option: {:?}. Choose 1-10.", other),
        }
    }
}
