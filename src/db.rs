use mongodb::{options::ClientOptions, Client, Collection, Database};

use crate::models::colaborador::Colaborador;
use crate::models::despesa::Despesa;
use crate::models::projecto::Projecto;
use crate::models::receita::Receita;
use crate::models::user::User;

pub struct MongoDB {
    pub db: Database,
}

impl MongoDB {
    pub async fn init(uri: &str, db_name: &str) -> Self {
        let client_options = ClientOptions::parse(uri)
            .await
            .expect("Failed to parse MongoDB connection string");
        let client = Client::with_options(client_options).expect("Failed to initialize client");
        let db = client.database(db_name);
        MongoDB { db }
    }

    pub fn colaboradores(&self) -> Collection<Colaborador> {
        self.db.collection("colaboradores")
    }

    pub fn projectos(&self) -> Collection<Projecto> {
        self.db.collection("projectos")
    }

    pub fn despesas(&self) -> Collection<Despesa> {
        self.db.collection("despesas")
    }

    pub fn receitas(&self) -> Collection<Receita> {
        self.db.collection("receitas")
    }

    pub fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }
}
