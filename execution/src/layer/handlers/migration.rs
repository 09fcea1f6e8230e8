use super::*;
use reflex_types::execution::LegacySource;

impl<'a, S: State> Layer<'a, S> {
    pub(in crate::layer) async fn handle_migrate_tokens(
        &mut self,
        public: &PublicKey,
    ) -> anyhow::Result<Vec<Event>> {
        if self.migration_in_flight {
            return Ok(economy_error_vec(
                public,
                ERROR_MIGRATION_BUSY,
                "Migration already in progress",
            ));
        }
        self.migration_in_flight = true;
        let result = self.migrate_tokens_inner(public).await;
        self.migration_in_flight = false;
        result
    }

    async fn migrate_tokens_inner(&mut self, public: &PublicKey) -> anyhow::Result<Vec<Event>> {
        let economy = self.get_or_init_economy().await?;
        if economy.paused {
            return Ok(economy_error_vec(public, ERROR_PAUSED, "Economy is paused"));
        }

        let mut player = self.get_or_init_player(public).await?;
        if player.has_migrated {
            return Ok(economy_error_vec(
                public,
                ERROR_ALREADY_MIGRATED,
                "Tokens already migrated",
            ));
        }

        let from_v1 = self.legacy_balance(LegacySource::V1, public).await?;
        let from_v2 = self.legacy_balance(LegacySource::V2, public).await?;
        let Some(total) = from_v1.checked_add(from_v2) else {
            return Ok(economy_error_vec(
                public,
                ERROR_SUPPLY_EXCEEDED,
                "Legacy balances overflow",
            ));
        };
        if total == 0 {
            return Ok(economy_error_vec(
                public,
                ERROR_NOTHING_TO_MIGRATE,
                "No legacy balance to migrate",
            ));
        }

        let mut ledger = self.get_or_init_ledger().await?;
        if !ledger.can_mint(total) {
            return Ok(economy_error_vec(
                public,
                ERROR_SUPPLY_EXCEEDED,
                "Mint would exceed max supply",
            ));
        }

        // Point of no return: debit both sources, mint the sum, set the flag.
        if from_v1 > 0 {
            self.remove(Key::LegacyBalance(LegacySource::V1, public.clone()));
        }
        if from_v2 > 0 {
            self.remove(Key::LegacyBalance(LegacySource::V2, public.clone()));
        }
        ledger
            .mint(&mut player.balance, total)
            .map_err(anyhow::Error::from)?;
        player.has_migrated = true;

        self.insert(Key::Player(public.clone()), Value::Player(player));
        self.insert(Key::Ledger, Value::Ledger(ledger));

        Ok(vec![Event::TokensMigrated {
            player: public.clone(),
            from_v1,
            from_v2,
            total,
        }])
    }

    async fn legacy_balance(
        &mut self,
        source: LegacySource,
        public: &PublicKey,
    ) -> anyhow::Result<u128> {
        Ok(
            match self.get(&Key::LegacyBalance(source, public.clone())).await? {
                Some(Value::LegacyBalance(amount)) => amount,
                _ => 0,
            },
        )
    }
}
