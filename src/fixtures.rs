#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::error::EnvError;
    use crate::options::Options;
    use crate::tags;
    use crate::value::EnvStruct;
    use crate::walk::Walker;
    use crate::Environment;

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct AppConfig {
        pub name: String,
        pub port: u16,
        pub debug: bool,
        pub timeout: Duration,
        pub hosts: Vec<String>,
        pub labels: HashMap<String, String>,
        pub ratio: Option<f64>,
        pub database: Database,
        pub cache: Option<Cache>,
        pub replicas: Vec<Server>,
        pub internal: u32,
    }

    impl EnvStruct for AppConfig {
        fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
            w.field("name", tags!(env = "APP_NAME,required"), &mut self.name)?;
            w.field("port", tags!(env = "PORT", envDefault = "8080"), &mut self.port)?;
            w.field("debug", tags!(env = "DEBUG"), &mut self.debug)?;
            w.field(
                "timeout",
                tags!(env = "TIMEOUT", envDefault = "30s"),
                &mut self.timeout,
            )?;
            w.field(
                "hosts",
                tags!(env = "HOSTS", envSeparator = ";"),
                &mut self.hosts,
            )?;
            w.field("labels", tags!(env = "LABELS"), &mut self.labels)?;
            w.field("ratio", tags!(env = "RATIO"), &mut self.ratio)?;
            w.field("database", tags!(envPrefix = "DB_"), &mut self.database)?;
            w.field(
                "cache",
                tags!(env = ",init", envPrefix = "CACHE_"),
                &mut self.cache,
            )?;
            w.field("replicas", tags!(envPrefix = "REPLICA"), &mut self.replicas)?;
            w.field("internal", tags!(env = "-"), &mut self.internal)
        }
    }

    // -- Nested structs ---------------------------------------------------------

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Database {
        pub url: Option<String>,
        pub pool_size: usize,
        pub password: String,
    }

    impl EnvStruct for Database {
        fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
            w.field("url", tags!(env = "URL"), &mut self.url)?;
            w.field(
                "pool_size",
                tags!(env = "POOL_SIZE", envDefault = "5"),
                &mut self.pool_size,
            )?;
            w.field("password", tags!(env = "PASSWORD,file"), &mut self.password)
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Cache {
        pub ttl: Duration,
    }

    impl EnvStruct for Cache {
        fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
            w.field("ttl", tags!(env = "TTL", envDefault = "1m"), &mut self.ttl)
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Server {
        pub host: String,
        pub port: u16,
    }

    impl EnvStruct for Server {
        fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
            w.field("host", tags!(env = "HOST"), &mut self.host)?;
            w.field("port", tags!(env = "PORT", envDefault = "80"), &mut self.port)
        }
    }

    // -- Fixture for embedding and pointer tests ---------------------------------

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Common {
        pub region: String,
    }

    impl EnvStruct for Common {
        fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
            w.field("region", tags!(env = "REGION"), &mut self.region)
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Embedding {
        pub common: Common,
        pub zone: String,
        pub fallback: Option<Cache>,
    }

    impl EnvStruct for Embedding {
        fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
            w.embed(tags!(), &mut self.common)?;
            w.field("zone", tags!(env = "ZONE"), &mut self.zone)?;
            w.field(
                "fallback",
                tags!(envPrefix = "FALLBACK_"),
                &mut self.fallback,
            )
        }
    }

    // -- Fixture for struct slice tests ------------------------------------------

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Fleet {
        pub servers: Vec<Server>,
        pub standby: Vec<Option<Server>>,
        pub backups: Option<Vec<Server>>,
    }

    impl EnvStruct for Fleet {
        fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
            w.field("servers", tags!(envPrefix = "SERVERS"), &mut self.servers)?;
            w.field("standby", tags!(envPrefix = "STANDBY_"), &mut self.standby)?;
            w.field("backups", tags!(envPrefix = "BACKUPS"), &mut self.backups)
        }
    }

    // -- Fixture for structural errors --------------------------------------------

    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Broken {
        pub a: String,
        pub b: String,
        pub c: String,
    }

    impl EnvStruct for Broken {
        fn bind(&mut self, w: &mut Walker<'_>) -> Result<(), EnvError> {
            w.field("a", tags!(env = "A"), &mut self.a)?;
            w.field("b", tags!(env = "B,bogus"), &mut self.b)?;
            w.field("c", tags!(env = "C"), &mut self.c)
        }
    }

    #[test]
    fn app_config_binds_defaults() {
        let config: AppConfig = Options::new()
            .environment(Environment::from_pairs([("APP_NAME", "fixture")]))
            .parse_as()
            .unwrap();
        assert_eq!(config.name, "fixture");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.hosts.is_empty());
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.pool_size, 5);
        assert!(config.replicas.is_empty());
    }
}
