use super::*;

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) async fn handle_purchase_turns(
        &mut self,
        public: &PublicKey,
    ) -> anyhow::Result<Vec<Event>> {
        let economy = self.get_or_init_economy().await?;
        if economy.paused {
            return Ok(economy_error_vec(public, ERROR_PAUSED, "Economy is paused"));
        }

        let mut player = self.get_or_init_player(public).await?;
        let mut ledger = self.get_or_init_ledger().await?;
        let cost = economy.pricing.turn_cost;
        if ledger.collect_fee(&mut player.balance, cost).is_err() {
            return Ok(economy_error_vec(
                public,
                ERROR_INSUFFICIENT_FUNDS,
                "Insufficient balance for turn purchase",
            ));
        }
        player.quota.grant_extra(TURN_TOPUP_BATCH);

        let extra_goes = player.quota.extra_goes;
        self.insert(Key::Player(public.clone()), Value::Player(player));
        self.insert(Key::Ledger, Value::Ledger(ledger));

        Ok(vec![Event::TurnsPurchased {
            player: public.clone(),
            batch: TURN_TOPUP_BATCH,
            cost,
            extra_goes,
        }])
    }

    pub(in crate::layer) async fn handle_purchase_weekly_pass(
        &mut self,
        public: &PublicKey,
    ) -> anyhow::Result<Vec<Event>> {
        let economy = self.get_or_init_economy().await?;
        if economy.paused {
            return Ok(economy_error_vec(public, ERROR_PAUSED, "Economy is paused"));
        }

        let mut player = self.get_or_init_player(public).await?;
        let mut ledger = self.get_or_init_ledger().await?;
        let cost = economy.pricing.weekly_pass_cost;
        if ledger.collect_fee(&mut player.balance, cost).is_err() {
            return Ok(economy_error_vec(
                public,
                ERROR_INSUFFICIENT_FUNDS,
                "Insufficient balance for weekly pass",
            ));
        }
        player.quota.extend_pass(self.now_secs());

        let expiry = player.quota.weekly_pass_expiry;
        self.insert(Key::Player(public.clone()), Value::Player(player));
        self.insert(Key::Ledger, Value::Ledger(ledger));

        Ok(vec![Event::WeeklyPassPurchased {
            player: public.clone(),
            cost,
            expiry,
        }])
    }

    pub(in crate::layer) async fn handle_claim_daily_reward(
        &mut self,
        public: &PublicKey,
    ) -> anyhow::Result<Vec<Event>> {
        let economy = self.get_or_init_economy().await?;
        if economy.paused {
            return Ok(economy_error_vec(public, ERROR_PAUSED, "Economy is paused"));
        }

        let mut player = self.get_or_init_player(public).await?;
        let reward = match player.daily.claim(self.now_secs()) {
            Ok(reward) => reward,
            Err(ClaimError::CooldownNotMet { remaining_secs }) => {
                return Ok(economy_error_vec(
                    public,
                    ERROR_COOLDOWN_NOT_MET,
                    format!("Daily claim available in {remaining_secs}s"),
                ));
            }
        };

        let mut ledger = self.get_or_init_ledger().await?;
        if ledger.mint(&mut player.balance, reward).is_err() {
            return Ok(economy_error_vec(
                public,
                ERROR_SUPPLY_EXCEEDED,
                "Mint would exceed max supply",
            ));
        }

        let streak = player.daily.streak;
        self.insert(Key::Player(public.clone()), Value::Player(player));
        self.insert(Key::Ledger, Value::Ledger(ledger));

        Ok(vec![Event::DailyRewardClaimed {
            player: public.clone(),
            reward,
            streak,
        }])
    }
}
