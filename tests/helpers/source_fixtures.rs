//! Common managed-source fixtures for tests.

// Single-inheritance chain with virtual/override/new members
pub const INHERITANCE_CHAIN: &str = r#"
namespace Shop
{
    public class Entity
    {
        public virtual string Key() { return "entity"; }
        public string Label() { return "label"; }
        private int Secret() { return 0; }
    }

    public class Customer : Entity
    {
        public override string Key() { return "customer"; }
        public string Email() { return "mail"; }
    }

    public class VipCustomer : Customer
    {
        public override string Key() { return "vip"; }
        public new string Label() { return "vip label"; }
    }
}
"#;

pub const PROPERTIES_AND_STATICS: &str = r#"
namespace Shop
{
    public class Base
    {
        public virtual int Count { get; set; }
        public static int Total { get; set; }
        public int Plain { get; set; }
    }

    public class Derived : Base
    {
        public override int Count { get; set; }
        public static int Version() { return 2; }
    }
}
"#;

pub const INTERFACES: &str = r#"
namespace Shop
{
    public interface IRepository
    {
        void Save();
    }

    public interface IAuditable : IRepository
    {
        string AuditTrail();
    }

    public class Store : IAuditable
    {
        public void Save() { }
        public string AuditTrail() { return "trail"; }
    }
}
"#;

pub const SHAPE_RECOVERY: &str = r#"
namespace Api
{
    public class Customer
    {
        public string Name { get; set; }
    }

    public class Handler
    {
        public object Find() { return new Customer(); }

        public object? FindMaybe() { return new Customer(); }

        public object Opaque(object input) { return input; }

        public object FromLocal()
        {
            Customer c = new Customer();
            return c;
        }

        public object FromVar()
        {
            var c = new Customer();
            return c;
        }

        public object Shaped()
        {
            return new { Id = 1, Name = "x" };
        }

        public object LambdaOnly()
        {
            var f = () => { return 42; };
            return f;
        }
    }

    public class AsyncHandler
    {
        public Task<object> FindAsync() { return new Customer(); }
    }
}
"#;

pub const ENUMS_AND_ATTRIBUTES: &str = r#"
namespace Shop
{
    [Table("orders")]
    [ApiVersion(2, Draft = true)]
    public class Order
    {
        public const string Kind = "order";

        [ObsoleteAttribute]
        public int Total() { return 0; }
    }

    public enum Status
    {
        Open,
        Held = 5,
        Closed,
    }
}
"#;

pub const FILE_SCOPED_NAMESPACE: &str = r#"
namespace Billing.Core;

public class Invoice
{
    public decimal Amount { get; set; }

    public string Render() => "invoice";
}
"#;
